//! Identifier list input.

use crate::error::Result;
use crate::types::Identifier;
use std::path::Path;

/// Read one Identifier per line from `path`
///
/// Trailing whitespace is stripped and blank lines are skipped. A missing
/// file is not an error: it is logged and yields an empty list.
///
/// # Errors
/// Any I/O error other than the file not existing.
pub async fn read_identifiers(path: &Path) -> Result<Vec<Identifier>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let identifiers = parse_identifiers(&contents);
            tracing::info!(path = %path.display(), count = identifiers.len(), "Read identifiers");
            Ok(identifiers)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Identifier file not found, nothing to harvest");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Split text into Identifiers, one per non-blank line, keeping order and duplicates
pub fn parse_identifiers(contents: &str) -> Vec<Identifier> {
    contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim_start().is_empty())
        .map(Identifier::from)
        .collect()
}
