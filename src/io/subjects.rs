use std::fs;
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Parse a newline-delimited subject list. A single trailing empty line is
/// dropped; order is preserved exactly.
pub fn parse_subject_list(text: &str) -> Vec<String> {
    let mut ids: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if ids.last().is_some_and(|last| last.is_empty()) {
        ids.pop();
    }
    ids
}

pub fn load_subject_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
    Ok(parse_subject_list(&text))
}
