//! Batch verification against a directory of labeled `.cnf` instances,
//! grounded on `original_source/verify_cdcl.py`.

use std::fs;
use std::path::Path;

use log::warn;

use crate::cdcl::{self, Outcome};
use crate::config::SolverConfig;
use crate::error::SolverError;

#[derive(Debug)]
pub struct Mismatch {
    pub file: String,
    pub expected_satisfiable: bool,
    pub solver_satisfiable: bool,
}

/// Find the `c SATISFIABLE` / `c UNSATISFIABLE` comment line. `UNSATISFIABLE`
/// is checked first since it contains `SATISFIABLE` as a substring.
fn expected_verdict(text: &str) -> Option<bool> {
    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('c') {
            continue;
        }
        if trimmed.contains("UNSATISFIABLE") {
            return Some(false);
        }
        if trimmed.contains("SATISFIABLE") {
            return Some(true);
        }
    }
    None
}

pub fn verify_directory(dir: &Path, config: &SolverConfig) -> Result<Vec<Mismatch>, SolverError> {
    let mut mismatches = Vec::new();
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "cnf"))
        .collect();
    entries.sort();

    for path in entries {
        let text = fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(expected) = expected_verdict(&text) else {
            warn!("{name}: no expected-verdict comment, skipping");
            continue;
        };
        let outcome = cdcl::solve(&text, config)?;
        let solver_satisfiable = matches!(outcome, Outcome::Satisfiable { .. });
        if solver_satisfiable != expected {
            mismatches.push(Mismatch {
                file: name,
                expected_satisfiable: expected,
                solver_satisfiable,
            });
        }
    }

    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_unsatisfiable_before_satisfiable_substring() {
        assert_eq!(expected_verdict("c generated\nc UNSATISFIABLE\np cnf 1 1\n"), Some(false));
    }

    #[test]
    fn recognizes_satisfiable() {
        assert_eq!(expected_verdict("c foo\nc SATISFIABLE\np cnf 1 1\n"), Some(true));
    }

    #[test]
    fn missing_comment_yields_none() {
        assert_eq!(expected_verdict("p cnf 1 1\n1 0\n"), None);
    }
}
