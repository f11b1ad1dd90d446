//! Solver parameter dump reader.
//!
//! The solver writes one `label: value` pair per line. Only the initial
//! capital is read back.

use std::path::Path;

use crate::error::{Error, Result};

/// Read the initial capital from the first line starting with `prefix`.
///
/// Lines with the prefix but no `:` are skipped. A line with the prefix
/// and an unparsable value is an error, as is a file with no such line.
pub fn read_initial_capital(path: &Path, prefix: &str) -> Result<f64> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    initial_capital_from(&text, prefix).map_err(|reason| Error::malformed(path, reason))
}

fn initial_capital_from(text: &str, prefix: &str) -> std::result::Result<f64, String> {
    for line in text.lines() {
        let line = line.trim();
        if !line.starts_with(prefix) {
            continue;
        }
        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let parts: Vec<&str> = compact.split(':').collect();
        if parts.len() <= 1 {
            continue;
        }
        return parts[1]
            .parse::<f64>()
            .map_err(|_| format!("'{line}': value '{}' is not a number", parts[1]));
    }
    Err(format!("no line starting with '{prefix}'"))
}
