//! Durable storage for training state.
//!
//! Interval checkpoints are append-only (one artifact per generation
//! ordinal) and indexed by an explicit JSON manifest, so resuming picks the
//! numerically highest ordinal instead of parsing filenames. The best genome
//! lives in an independent single-slot artifact. Artifacts are bincode
//! encoded and LZ4 compressed behind a small magic/version header.

use crate::evo::genome::Genome;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for artifact identification.
const MAGIC: &[u8; 4] = b"NEVO";

/// Current artifact format version.
const VERSION: u8 = 1;

/// Manifest filename inside the store directory.
const MANIFEST_FILE: &str = "manifest.json";

/// Best-genome slot filename inside the store directory.
const BEST_FILE: &str = "best.genome";

/// A resumable snapshot of training state.
///
/// `population` and `fitness` are index-aligned: entry `i` of `fitness`
/// belongs to genome `i` of `population`. Resume re-enters the loop at
/// `generation` and re-evaluates it, which replays identically because the
/// per-generation RNG streams derive from `seed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Ordinal of the evaluated generation this snapshot covers.
    pub generation: u32,
    /// The population evaluated in generation `generation`.
    pub population: Vec<Genome>,
    /// Fitness of `population`, index-aligned.
    pub fitness: Vec<f64>,
    /// Best fitness recorded so far in the run.
    pub best_fitness: f64,
    /// Base RNG seed of the run; per-generation state derives from it.
    pub seed: u64,
}

/// The single-slot best-genome artifact, replaced on every new best.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestGenome {
    /// The fittest genome recorded so far.
    pub genome: Genome,
    /// Its fitness.
    pub fitness: f64,
    /// Generation in which it was found.
    pub generation: u32,
}

/// Ordinal-to-filename index of interval checkpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Manifest {
    entries: BTreeMap<u32, String>,
}

/// Filesystem store for checkpoints and the best genome.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Write a new checkpoint entry and record it in the manifest.
    ///
    /// Entries are append-only: a new ordinal gets a new artifact, prior
    /// entries are never mutated. Writing the same ordinal twice replaces
    /// only that entry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails. Callers treat
    /// this as fatal to the training run.
    pub fn save(&self, checkpoint: &Checkpoint) -> io::Result<PathBuf> {
        let name = format!("gen_{:05}.ckpt", checkpoint.generation);
        let path = self.dir.join(&name);
        write_artifact(&path, checkpoint)?;

        let mut manifest = self.load_manifest()?;
        manifest.entries.insert(checkpoint.generation, name);
        self.store_manifest(&manifest)?;
        Ok(path)
    }

    /// Load the checkpoint with the numerically highest ordinal, or `None`
    /// if the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest or the artifact cannot be read.
    pub fn load_latest(&self) -> io::Result<Option<Checkpoint>> {
        let manifest = self.load_manifest()?;
        let Some((_, name)) = manifest.entries.last_key_value() else {
            return Ok(None);
        };
        read_artifact(&self.dir.join(name)).map(Some)
    }

    /// Load the checkpoint at a specific ordinal.
    ///
    /// # Errors
    ///
    /// Returns an error if the ordinal is unknown or the artifact cannot be
    /// read.
    pub fn load(&self, generation: u32) -> io::Result<Checkpoint> {
        let manifest = self.load_manifest()?;
        let name = manifest.entries.get(&generation).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no checkpoint for generation {generation}"),
            )
        })?;
        read_artifact(&self.dir.join(name))
    }

    /// Ordinals of all stored checkpoints, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read.
    pub fn ordinals(&self) -> io::Result<Vec<u32>> {
        Ok(self.load_manifest()?.entries.keys().copied().collect())
    }

    /// Overwrite the single-slot best-genome artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails.
    pub fn save_best(&self, best: &BestGenome) -> io::Result<()> {
        write_artifact(&self.dir.join(BEST_FILE), best)
    }

    /// Load the best genome, or `None` if none has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact exists but cannot be read.
    pub fn load_best(&self) -> io::Result<Option<BestGenome>> {
        let path = self.dir.join(BEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_artifact(&path).map(Some)
    }

    fn load_manifest(&self) -> io::Result<Manifest> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn store_manifest(&self, manifest: &Manifest) -> io::Result<()> {
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.dir.join(MANIFEST_FILE), json)
    }
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let encoded =
        bincode::serialize(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let compressed = lz4_flex::compress_prepend_size(&encoded);

    let mut file = fs::File::create(path)?;
    file.write_all(MAGIC)?;
    file.write_all(&[VERSION])?;
    file.write_all(&compressed)
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> io::Result<T> {
    let mut file = fs::File::open(path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid artifact magic",
        ));
    }

    let mut version = [0u8; 1];
    file.read_exact(&mut version)?;
    if version[0] != VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported artifact version: {}", version[0]),
        ));
    }

    let mut compressed = Vec::new();
    file.read_to_end(&mut compressed)?;
    let decompressed = lz4_flex::decompress_size_prepended(&compressed)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    bincode::deserialize(&decompressed).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use tempfile::tempdir;

    fn checkpoint(generation: u32, seed: u64) -> Checkpoint {
        let mut rng = SmallRng::seed_from_u64(seed);
        let population: Vec<Genome> = (0..6).map(|_| Genome::random(&mut rng, 8, 2, 1)).collect();
        let fitness: Vec<f64> = (0..6).map(|i| f64::from(i) * 1.5).collect();
        Checkpoint {
            generation,
            population,
            fitness,
            best_fitness: 7.5,
            seed,
        }
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        let original = checkpoint(42, 123);

        store.save(&original).unwrap();
        let loaded = store.load(42).unwrap();

        assert_eq!(loaded.generation, 42);
        assert_eq!(loaded.population, original.population);
        assert_eq!(loaded.fitness, original.fitness);
        assert_eq!(loaded.seed, 123);
    }

    #[test]
    fn test_latest_picks_highest_ordinal_not_lexical() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();

        // Lexically "10" sorts before "9"; the manifest must not.
        for generation in [5, 9, 10] {
            store.save(&checkpoint(generation, 1)).unwrap();
        }

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.generation, 10);
        assert_eq!(store.ordinals().unwrap(), vec![5, 9, 10]);
    }

    #[test]
    fn test_empty_store_has_no_latest() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        assert!(store.load_latest().unwrap().is_none());
        assert!(store.load_best().unwrap().is_none());
    }

    #[test]
    fn test_best_slot_overwrites() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        let mut rng = SmallRng::seed_from_u64(9);

        store
            .save_best(&BestGenome {
                genome: Genome::random(&mut rng, 8, 2, 1),
                fitness: 10.0,
                generation: 3,
            })
            .unwrap();
        let better = Genome::random(&mut rng, 8, 2, 1);
        store
            .save_best(&BestGenome {
                genome: better.clone(),
                fitness: 20.0,
                generation: 8,
            })
            .unwrap();

        let loaded = store.load_best().unwrap().unwrap();
        assert_eq!(loaded.genome, better);
        assert!((loaded.fitness - 20.0).abs() < f64::EPSILON);
        assert_eq!(loaded.generation, 8);
    }

    #[test]
    fn test_invalid_magic_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.ckpt");
        fs::write(&path, b"BAADfood").unwrap();
        assert!(read_artifact::<Checkpoint>(&path).is_err());
    }

    #[test]
    fn test_prior_entries_survive_new_saves() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();

        store.save(&checkpoint(5, 1)).unwrap();
        store.save(&checkpoint(10, 2)).unwrap();

        let old = store.load(5).unwrap();
        assert_eq!(old.generation, 5);
        assert_eq!(old.seed, 1);
    }
}
