//! DIMACS CNF reader (spec §6).
//!
//! Unlike the `dimacs` crate's own parser, this validates the header against
//! the parsed body (duplicate `p` line, variable/clause count mismatch) with
//! line-numbered diagnostics, and performs the normalization spec §3
//! describes for [`crate::formula::Formula`] construction: tautological
//! clauses are dropped, repeated literals within a clause are collapsed, and
//! an explicitly empty clause is noted so the caller can treat the formula as
//! unsatisfiable at the root. This mirrors the single parse-and-normalize
//! pass of the original `formula.py`, split out as its own module per the
//! "DIMACS Parser" row of spec §2.

use std::collections::HashSet;

use crate::error::DimacsError;

/// A CNF formula after header validation and clause normalization, ready to
/// be handed to [`crate::formula::Formula::new`].
#[derive(Debug, Clone)]
pub struct ParsedCnf {
    pub num_vars: usize,
    /// Normalized clauses: sorted, deduplicated, tautology-free, non-empty.
    pub clauses: Vec<Vec<i64>>,
    /// Set when the input contained a literally empty clause.
    pub forced_unsat: bool,
}

fn flush_clause(
    current: &mut Vec<i64>,
    tautological: &mut bool,
    clauses: &mut Vec<Vec<i64>>,
    ignored: &mut usize,
    forced_unsat: &mut bool,
) {
    if current.is_empty() {
        *forced_unsat = true;
        *ignored += 1;
    } else if *tautological {
        *ignored += 1;
    } else {
        let mut normalized = std::mem::take(current);
        normalized.sort_unstable();
        normalized.dedup();
        clauses.push(normalized);
    }
    current.clear();
    *tautological = false;
}

pub fn parse_cnf(input: &str) -> Result<ParsedCnf, DimacsError> {
    let mut num_vars: Option<usize> = None;
    let mut num_clauses: Option<usize> = None;

    let mut clauses: Vec<Vec<i64>> = Vec::new();
    let mut current: Vec<i64> = Vec::new();
    let mut tautological = false;
    let mut ignored = 0usize;
    let mut forced_unsat = false;
    let mut variables: HashSet<i64> = HashSet::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        match line.as_bytes()[0] {
            b'c' => continue,
            b'p' => {
                if num_vars.is_some() || num_clauses.is_some() {
                    return Err(DimacsError::DuplicateProblemLine { line: line_no });
                }
                let mut parts = line.split_whitespace();
                parts.next(); // 'p'
                let cnf_tag = parts.next();
                if cnf_tag != Some("cnf") {
                    return Err(DimacsError::InvalidToken {
                        line: line_no,
                        token: line.to_string(),
                    });
                }
                let nv: usize = parts
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| DimacsError::InvalidToken {
                        line: line_no,
                        token: line.to_string(),
                    })?;
                let nc: usize = parts
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| DimacsError::InvalidToken {
                        line: line_no,
                        token: line.to_string(),
                    })?;
                num_vars = Some(nv);
                num_clauses = Some(nc);
                continue;
            }
            _ => {
                for token in line.split_whitespace() {
                    let lit: i64 = token.parse().map_err(|_| DimacsError::InvalidToken {
                        line: line_no,
                        token: token.to_string(),
                    })?;
                    if lit == 0 {
                        flush_clause(
                            &mut current,
                            &mut tautological,
                            &mut clauses,
                            &mut ignored,
                            &mut forced_unsat,
                        );
                        continue;
                    }
                    if !tautological && current.contains(&-lit) {
                        tautological = true;
                        ignored += 1;
                    }
                    current.push(lit);
                    variables.insert(lit.abs());
                }
            }
        }
    }

    // A final clause without a terminating 0 is tolerated (spec §6).
    if !current.is_empty() {
        if tautological {
            ignored += 1;
        } else {
            let mut normalized = current;
            normalized.sort_unstable();
            normalized.dedup();
            clauses.push(normalized);
        }
    }

    let num_clauses = num_clauses.ok_or(DimacsError::MissingProblemLine)?;
    let num_vars = num_vars.ok_or(DimacsError::MissingProblemLine)?;

    if clauses.len() + ignored != num_clauses {
        return Err(DimacsError::ClauseCountMismatch {
            declared: num_clauses,
            parsed: clauses.len() + ignored,
        });
    }
    if variables.len() != num_vars {
        return Err(DimacsError::VarCountMismatch {
            declared: num_vars,
            parsed: variables.len(),
        });
    }

    Ok(ParsedCnf {
        num_vars,
        clauses,
        forced_unsat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_formula_is_satisfiable() {
        let parsed = parse_cnf("p cnf 0 0\n").unwrap();
        assert_eq!(parsed.num_vars, 0);
        assert!(parsed.clauses.is_empty());
        assert!(!parsed.forced_unsat);
    }

    #[test]
    fn contradictory_units() {
        let parsed = parse_cnf("p cnf 1 2\n1 0\n-1 0\n").unwrap();
        assert_eq!(parsed.clauses, vec![vec![1], vec![-1]]);
    }

    #[test]
    fn duplicate_problem_line_is_rejected() {
        let err = parse_cnf("p cnf 1 1\np cnf 1 1\n1 0\n").unwrap_err();
        assert!(matches!(err, DimacsError::DuplicateProblemLine { line: 2 }));
    }

    #[test]
    fn clause_count_mismatch_is_rejected() {
        let err = parse_cnf("p cnf 1 2\n1 0\n").unwrap_err();
        assert!(matches!(err, DimacsError::ClauseCountMismatch { .. }));
    }

    #[test]
    fn variable_count_mismatch_is_rejected() {
        let err = parse_cnf("p cnf 2 1\n1 0\n").unwrap_err();
        assert!(matches!(err, DimacsError::VarCountMismatch { .. }));
    }

    #[test]
    fn tautological_clause_is_dropped_but_counted() {
        let parsed = parse_cnf("p cnf 2 2\n1 -1 2 0\n2 0\n").unwrap();
        assert_eq!(parsed.clauses, vec![vec![2]]);
    }

    #[test]
    fn repeated_literals_are_collapsed() {
        let parsed = parse_cnf("p cnf 1 1\n1 1 0\n").unwrap();
        assert_eq!(parsed.clauses, vec![vec![1]]);
    }

    #[test]
    fn empty_clause_forces_unsat() {
        let parsed = parse_cnf("p cnf 1 2\n0\n1 0\n").unwrap();
        assert!(parsed.forced_unsat);
    }

    #[test]
    fn unterminated_final_clause_is_tolerated() {
        let parsed = parse_cnf("p cnf 1 1\n1").unwrap();
        assert_eq!(parsed.clauses, vec![vec![1]]);
    }
}
