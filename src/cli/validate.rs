//! Puzzle repository validation command.

use crate::cli::CliError;
use nonevo::PuzzleRecord;
use std::fs;
use std::path::PathBuf;

/// Execute the validate command.
pub(crate) fn execute(file: PathBuf, size: usize) -> Result<(), CliError> {
    let data = fs::read_to_string(&file)?;
    let records: Vec<PuzzleRecord> = serde_json::from_str(&data)
        .map_err(|e| CliError::new(format!("{}: {e}", file.display())))?;

    let mut malformed = 0usize;
    for record in &records {
        if let Err(e) = record.validate(size) {
            malformed += 1;
            println!("  {e}");
        }
    }

    println!(
        "{}: {} records for {size}x{size}, {malformed} malformed",
        file.display(),
        records.len()
    );
    if malformed > 0 {
        return Err(CliError::new(format!("{malformed} malformed records")));
    }
    Ok(())
}
