//! Pluggable decision heuristics (spec §4.6). The driver is polymorphic over
//! a small capability trait, matching the `Brancher` ABC of the original
//! `brancher.py` and its three concrete subclasses.

use std::collections::HashMap;

use dimacs::Lit;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

use crate::assignment::Assignment;
use crate::clause::ClauseArena;
use crate::lit::{is_positive, Value, VarId};

pub trait Brancher {
    fn make_decision(&mut self, assignment: &Assignment) -> (VarId, Value);

    /// Called for each literal that survived into the resolvent during
    /// conflict analysis.
    fn record_resolved_lit(&mut self, _lit: Lit) {}

    /// Called once per learned clause, with its final literals.
    fn record_learned_clause(&mut self, _clause: &[i64]) {}
}

/// Picks any unassigned variable; always tries `false` first. Grounded on
/// `arbitrary_brancher.py`.
pub struct ArbitraryBrancher;

impl ArbitraryBrancher {
    pub fn new(_clauses: &ClauseArena) -> ArbitraryBrancher {
        ArbitraryBrancher
    }
}

impl Brancher for ArbitraryBrancher {
    fn make_decision(&mut self, assignment: &Assignment) -> (VarId, Value) {
        let var = assignment
            .unassigned_vars()
            .next()
            .expect("make_decision called with no unassigned variables");
        (var, Value::False)
    }
}

/// Picks a uniformly random unassigned variable; always tries `false` first.
/// Grounded on `random_brancher.py`.
pub struct RandomBrancher {
    rng: StdRng,
}

impl RandomBrancher {
    pub fn new(_clauses: &ClauseArena, seed: u64) -> RandomBrancher {
        RandomBrancher {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Brancher for RandomBrancher {
    fn make_decision(&mut self, assignment: &Assignment) -> (VarId, Value) {
        let vars: Vec<VarId> = assignment.unassigned_vars().collect();
        let var = *vars
            .choose(&mut self.rng)
            .expect("make_decision called with no unassigned variables");
        (var, Value::False)
    }
}

/// Jeroslow-Wang-ish heuristic: scores each variable by how many
/// non-binary clauses it appears in, computed once from the initial
/// formula. Grounded on `two_choice_brancher.py`.
pub struct TwoChoiceBrancher {
    scores: Vec<u32>,
    rng: StdRng,
}

impl TwoChoiceBrancher {
    pub fn new(clauses: &ClauseArena, seed: u64) -> TwoChoiceBrancher {
        let mut scores = HashMap::new();
        for (_, clause) in clauses.iter() {
            for var in clause.vars() {
                scores.entry(var).or_insert(0u32);
            }
            if clause.len() != 2 {
                for var in clause.vars() {
                    *scores.entry(var).or_insert(0) += 1;
                }
            }
        }
        let max_var = scores.keys().map(|v| v.0).max().unwrap_or(0);
        let mut dense = vec![0u32; max_var];
        for (var, score) in scores {
            dense[var.index0()] = score;
        }
        TwoChoiceBrancher {
            scores: dense,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Brancher for TwoChoiceBrancher {
    fn make_decision(&mut self, assignment: &Assignment) -> (VarId, Value) {
        let mut best_score = 0u32;
        let mut best: Vec<VarId> = Vec::new();
        for var in assignment.unassigned_vars() {
            let score = self.scores[var.index0()];
            if score > best_score || best.is_empty() {
                if score > best_score {
                    best.clear();
                }
                best_score = score;
                best.push(var);
            } else if score == best_score {
                best.push(var);
            }
        }
        let var = *best.choose(&mut self.rng).unwrap();
        let value = if self.rng.gen_bool(0.5) {
            Value::True
        } else {
            Value::False
        };
        (var, value)
    }
}

/// Variable State Independent Decaying Sum, grounded on `vsids_brancher.py`.
pub struct VsidsBrancher {
    scores: Vec<u64>,
    preferred: Vec<Value>,
    bonus: u64,
    max_score: u64,
}

const VSIDS_RESCALE_THRESHOLD: u64 = 1 << 24;
const VSIDS_RESCALE_SHIFT: u64 = 1 << 16;

impl VsidsBrancher {
    pub fn new(clauses: &ClauseArena, num_vars: usize) -> VsidsBrancher {
        let mut neg_counts = vec![0u64; num_vars];
        let mut pos_counts = vec![0u64; num_vars];
        for (_, clause) in clauses.iter() {
            for &lit in clause.literals() {
                let idx = VarId::from_lit(lit).index0();
                if is_positive(lit) {
                    pos_counts[idx] += 1;
                } else {
                    neg_counts[idx] += 1;
                }
            }
        }
        let mut scores = vec![0u64; num_vars];
        let mut preferred = vec![Value::True; num_vars];
        let mut max_score = 0u64;
        for i in 0..num_vars {
            let total = pos_counts[i] + neg_counts[i];
            scores[i] = total;
            preferred[i] = if neg_counts[i] > pos_counts[i] {
                Value::False
            } else {
                Value::True
            };
            max_score = max_score.max(total);
        }
        let bonus = (max_score + 2) / 3 + 1;
        VsidsBrancher {
            scores,
            preferred,
            bonus,
            max_score,
        }
    }

    fn bump(&mut self, var: VarId) {
        let idx = var.index0();
        self.scores[idx] += self.bonus;
        self.max_score = self.max_score.max(self.scores[idx]);
    }

    fn maintenance(&mut self) {
        if self.max_score > VSIDS_RESCALE_THRESHOLD || self.bonus > VSIDS_RESCALE_THRESHOLD {
            self.bonus = (self.bonus / VSIDS_RESCALE_SHIFT).max(1);
            for score in &mut self.scores {
                *score /= VSIDS_RESCALE_SHIFT;
            }
            self.max_score /= VSIDS_RESCALE_SHIFT;
        }
    }

    fn grow_bonus(&mut self) {
        self.bonus = (self.bonus * 6 + 4) / 5;
    }
}

impl Brancher for VsidsBrancher {
    fn record_resolved_lit(&mut self, lit: Lit) {
        self.bump(VarId::from_lit(lit));
        self.maintenance();
    }

    fn record_learned_clause(&mut self, clause: &[i64]) {
        for &lit in clause {
            self.bump(VarId::new(lit.unsigned_abs() as usize));
        }
        self.grow_bonus();
        self.maintenance();
    }

    fn make_decision(&mut self, assignment: &Assignment) -> (VarId, Value) {
        let mut best_var = None;
        let mut best_score = 0u64;
        for var in assignment.unassigned_vars() {
            let score = self.scores[var.index0()];
            if best_var.is_none() || score >= best_score {
                best_var = Some(var);
                best_score = score;
            }
        }
        let var = best_var.expect("make_decision called with no unassigned variables");
        (var, self.preferred[var.index0()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Clause;

    fn arena(cnf: &[&[i64]]) -> ClauseArena {
        let mut arena = ClauseArena::new();
        for clause in cnf {
            let lits: Vec<Lit> = clause.iter().map(|&x| Lit::from_i64(x)).collect();
            arena.push(Clause::new(lits));
        }
        arena
    }

    #[test]
    fn vsids_bump_and_rescale_stay_bounded() {
        let a = arena(&[&[1, 2, 3], &[-1, 2], &[1, -3]]);
        let mut brancher = VsidsBrancher::new(&a, 3);
        for _ in 0..64 {
            brancher.record_learned_clause(&[1, -2, 3]);
        }
        assert!(brancher.max_score <= 1 << 25);
        assert!(brancher.bonus <= 1 << 25);
    }

    #[test]
    fn two_choice_prefers_non_binary_clause_membership() {
        let a = arena(&[&[1, 2, 3], &[1, 2]]);
        let brancher = TwoChoiceBrancher::new(&a, 0);
        // var 3 only appears in the ternary clause, vars 1/2 in both.
        assert!(brancher.scores[0] >= brancher.scores[2]);
    }
}
