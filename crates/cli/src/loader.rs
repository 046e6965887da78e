use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use course_stats_core::{CourseRecord, Dataset};

/// Reads course records from any CSV source with the standard header.
///
/// # Errors
/// Returns an error on malformed rows or missing columns.
pub fn read_records<R: Read>(source: R) -> Result<Vec<CourseRecord>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut records = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: CourseRecord =
            result.with_context(|| format!("Failed to parse CSV row {}", row + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Loads a CSV file into a [`Dataset`].
///
/// # Errors
/// Returns an error if the file cannot be opened or parsed, or holds no rows.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let records = read_records(file)?;
    if records.is_empty() {
        anyhow::bail!("CSV file is empty: {}", path.display());
    }
    tracing::info!(rows = records.len(), path = %path.display(), "Loaded course records");
    Ok(Dataset::from_records(&records)?)
}
