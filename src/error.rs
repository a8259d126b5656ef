//! Error taxonomy for the solver, following spec §7: parse errors and I/O
//! errors are fatal and surfaced to the caller; invariant violations are bugs
//! rather than runtime conditions. UNSATISFIABLE is a normal verdict, never an
//! error, and is not represented here.

use thiserror::Error;

/// Malformed DIMACS CNF input. Grounded on the structured-variant style of
/// `varisat-dimacs::ParserError`, adapted to the validation rules in spec §6.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DimacsError {
    #[error("line {line}: a second 'p' problem line is not allowed")]
    DuplicateProblemLine { line: usize },

    #[error("input has no 'p cnf <vars> <clauses>' problem line")]
    MissingProblemLine,

    #[error("line {line}: invalid token '{token}'")]
    InvalidToken { line: usize, token: String },

    #[error(
        "declared {declared} clauses in the problem line, but parsed {parsed} (tautological and empty clauses count toward this total)"
    )]
    ClauseCountMismatch { declared: usize, parsed: usize },

    #[error("declared {declared} variables in the problem line, but {parsed} distinct variables appear in the body")]
    VarCountMismatch { declared: usize, parsed: usize },
}

/// Top level error type for the solver crate.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("parse error: {0}")]
    Dimacs(#[from] DimacsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal invariant violation: {0}")]
    Invariant(String),
}

impl SolverError {
    pub fn invariant<S: Into<String>>(message: S) -> SolverError {
        SolverError::Invariant(message.into())
    }
}
