//! The top level CDCL driver loop (spec §4.7). Ported from the original
//! `cdcl.py`: decide, propagate (inside [`PropagatingFormula`]), and on
//! conflict analyze/backjump/learn until the formula resolves or a conflict
//! survives at decision level 0.

use log::{debug, info};

use crate::brancher::Brancher;
use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::formula::FormulaState;
use crate::fuip;
use crate::lit::{Value, VarId};
use crate::propagating_formula::PropagatingFormula;

#[derive(Clone, Copy, Default, Debug)]
pub struct Stats {
    pub decisions: usize,
    pub conflicts: usize,
    pub learned_clauses: usize,
}

pub enum Outcome {
    Satisfiable {
        assignment: Vec<(VarId, Value)>,
        stats: Stats,
    },
    Unsatisfiable {
        stats: Stats,
    },
}

pub fn solve(input: &str, config: &SolverConfig) -> Result<Outcome, SolverError> {
    let mut formula = PropagatingFormula::from_dimacs(input)?;
    let num_vars = formula.formula().num_vars();
    let mut brancher = config.build_brancher(formula.formula().clauses(), num_vars);
    Ok(run(&mut formula, brancher.as_mut()))
}

/// Run CDCL to completion against an already-constructed formula, so callers
/// (e.g. the `encode` front end) can add extra clauses before the search
/// starts.
pub fn run(formula: &mut PropagatingFormula, brancher: &mut dyn Brancher) -> Outcome {
    let mut stats = Stats::default();

    if formula.get_current_state() == FormulaState::Unsatisfied {
        return Outcome::Unsatisfiable { stats };
    }

    while formula.get_current_state() != FormulaState::Satisfied {
        let (var, value) = brancher.make_decision(formula.assignment());
        stats.decisions += 1;
        debug!("decision {}: {} = {:?}", stats.decisions, var, value);
        formula.decide(var, value);

        while formula.get_current_state() == FormulaState::Unsatisfied {
            if formula.decision_level() == 0 {
                info!(
                    "unsatisfiable after {} decisions, {} conflicts",
                    stats.decisions, stats.conflicts
                );
                return Outcome::Unsatisfiable { stats };
            }
            stats.conflicts += 1;
            let analysis = match fuip::analyze(formula, brancher) {
                Ok(a) => a,
                Err(_) => {
                    return Outcome::Unsatisfiable { stats };
                }
            };
            if analysis.backjump_level < 0 {
                info!(
                    "unsatisfiable after {} decisions, {} conflicts",
                    stats.decisions, stats.conflicts
                );
                return Outcome::Unsatisfiable { stats };
            }
            debug!(
                "learned clause of size {}, backjump to level {}",
                analysis.learned_clause.len(),
                analysis.backjump_level
            );
            formula.backtrack(analysis.backjump_level as usize);
            brancher.record_learned_clause(&analysis.learned_clause);
            formula.add_clause(analysis.learned_clause);
            stats.learned_clauses += 1;
        }
    }

    info!(
        "satisfiable after {} decisions, {} conflicts",
        stats.decisions, stats.conflicts
    );
    let assignment = formula
        .assignment()
        .history()
        .iter()
        .map(|item| (item.var, item.value))
        .collect();
    Outcome::Satisfiable { assignment, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brancher::ArbitraryBrancher;

    fn solved(input: &str, kind: crate::config::BrancherKind) -> Outcome {
        let config = SolverConfig {
            brancher: kind,
            seed: 7,
        };
        solve(input, &config).unwrap()
    }

    #[test]
    fn trivially_satisfiable_formula_is_solved() {
        match solved("p cnf 3 3\n1 2 0\n-1 2 0\n-2 3 0\n", crate::config::BrancherKind::Vsids) {
            Outcome::Satisfiable { .. } => {}
            Outcome::Unsatisfiable { .. } => panic!("expected SAT"),
        }
    }

    #[test]
    fn pigeonhole_two_into_one_is_unsat() {
        // 1 and 2 can't both be true, but both are forced true.
        let input = "p cnf 2 3\n1 0\n2 0\n-1 -2 0\n";
        match solved(input, crate::config::BrancherKind::Vsids) {
            Outcome::Unsatisfiable { .. } => {}
            Outcome::Satisfiable { .. } => panic!("expected UNSAT"),
        }
    }

    #[test]
    fn requires_backjumping_across_unrelated_decision() {
        // var 1 is a red herring decision; the real conflict is between 2 and 3.
        let input = "p cnf 3 4\n1 2 0\n1 3 0\n-2 -3 0\n2 3 0\n";
        let mut pf = PropagatingFormula::from_dimacs(input).unwrap();
        let mut brancher = ArbitraryBrancher::new(pf.formula().clauses());
        match run(&mut pf, &mut brancher) {
            Outcome::Satisfiable { assignment, .. } => {
                assert_eq!(assignment.len(), 3);
            }
            Outcome::Unsatisfiable { .. } => panic!("expected SAT"),
        }
    }
}
