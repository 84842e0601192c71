use crate::error::{GraphError, Result};
use crate::model::CitationRow;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read citation rows from a CSV file with the header
/// `page_title,page_id,pub_id_type,pub_id_value`.
pub fn load_citations(path: &Path) -> Result<Vec<CitationRow>> {
    let file = File::open(path)?;
    read_citations(file)
}

/// Read citation rows from any CSV source. Syntax errors and missing fields
/// fail fast with the offending line.
pub fn read_citations<R: Read>(reader: R) -> Result<Vec<CitationRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in reader.deserialize::<CitationRow>() {
        let row = result.map_err(|e| {
            let line = e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 2);
            GraphError::Validation {
                line,
                reason: e.to_string(),
            }
        })?;
        rows.push(row);
    }
    debug!(rows = rows.len(), "citation table loaded");
    Ok(rows)
}
