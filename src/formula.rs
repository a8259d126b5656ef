//! The `Formula` layer (spec §3, §4.3): owns every clause, indexes which
//! clauses watch each variable, and tracks unit/unsat clauses and per-level
//! mutation history so that `backtrack` can undo watch migrations exactly.
//! Ported from the original `formula.py`.

use std::collections::{HashSet, VecDeque};

use dimacs::Lit;

use crate::assignment::Assignment;
use crate::clause::{Clause, ClauseArena, ClauseId, ClauseState};
use crate::dimacs::ParsedCnf;
use crate::lit::{Value, VarId};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormulaState {
    Satisfied,
    Unresolved,
    Unsatisfied,
}

pub struct Formula {
    clauses: ClauseArena,
    /// Parse-time observation that overrides everything else: an explicitly
    /// empty clause forces UNSATISFIABLE, a formula with zero non-trivial
    /// clauses forces SATISFIABLE (empty-clause takes precedence when both
    /// would apply — see DESIGN.md).
    base_state: FormulaState,
    variable_clauses: Vec<HashSet<ClauseId>>,
    mutation_history: Vec<HashSet<ClauseId>>,
    state_history: Vec<FormulaState>,
    unsat_clauses: HashSet<ClauseId>,
    unit_clauses: HashSet<ClauseId>,
    unit_queue: VecDeque<ClauseId>,
    decision_level: usize,
    assignment: Assignment,
}

impl Formula {
    pub fn new(parsed: ParsedCnf) -> Formula {
        let base_state = if parsed.forced_unsat {
            FormulaState::Unsatisfied
        } else if parsed.clauses.is_empty() {
            FormulaState::Satisfied
        } else {
            FormulaState::Unresolved
        };

        let mut formula = Formula {
            clauses: ClauseArena::new(),
            base_state,
            variable_clauses: (0..parsed.num_vars).map(|_| HashSet::new()).collect(),
            mutation_history: vec![HashSet::new()],
            state_history: vec![base_state],
            unsat_clauses: HashSet::new(),
            unit_clauses: HashSet::new(),
            unit_queue: VecDeque::new(),
            decision_level: 0,
            assignment: Assignment::new(parsed.num_vars),
        };

        for literals in parsed.clauses {
            formula.add_base_clause(literals);
        }

        formula
    }

    fn add_base_clause(&mut self, literals: Vec<i64>) {
        let lits: Vec<Lit> = literals.into_iter().map(Lit::from_i64).collect();
        let clause = Clause::new(lits);
        let (head_var, tail_var) = clause.head_tail_var();
        let is_unit = clause.len() == 1;
        let id = self.clauses.push(clause);

        self.variable_clauses[head_var.index0()].insert(id);
        self.variable_clauses[tail_var.index0()].insert(id);
        if is_unit {
            self.unit_clauses.insert(id);
            self.unit_queue.push_back(id);
        }
    }

    /// Add a learned (or otherwise post-initialization) clause, aligning its
    /// watches to the current assignment before indexing it.
    ///
    /// The original `formula.py` retroactively patches `state_history` and
    /// `mutation_history` at every past decision level; that is only needed
    /// if a clause could be added while the formula is already SAT/UNSAT,
    /// which the driver never does, so it is omitted here (spec §9 Open
    /// Questions).
    pub fn add_clause(&mut self, literals: Vec<i64>) -> ClauseId {
        let lits: Vec<Lit> = literals.into_iter().map(Lit::from_i64).collect();
        let mut clause = Clause::new(lits);
        clause.assign(&self.assignment);
        let id = self.clauses.push(clause);

        let (state, head_var, tail_var) = self.clauses.get(id).state(&self.assignment);
        if matches!(state, ClauseState::Unresolved | ClauseState::Unit) {
            self.variable_clauses[head_var.index0()].insert(id);
            self.variable_clauses[tail_var.index0()].insert(id);
        }
        if state == ClauseState::Unit {
            self.unit_clauses.insert(id);
            self.unit_queue.push_back(id);
        }
        if state == ClauseState::Unsatisfied {
            self.unsat_clauses.insert(id);
            if let Some(top) = self.state_history.last_mut() {
                *top = FormulaState::Unsatisfied;
            }
        }
        id
    }

    pub fn assign(
        &mut self,
        level: usize,
        var: VarId,
        value: Value,
        antecedent: Option<ClauseId>,
    ) {
        self.assignment.add(level, var, value, antecedent);
        self.decision_level = level;

        while self.mutation_history.len() <= level {
            self.mutation_history.push(HashSet::new());
        }
        while self.state_history.len() <= level {
            let carry = *self.state_history.last().unwrap();
            self.state_history.push(carry);
        }

        let mut state = *self.state_history.last().unwrap();
        let stale = std::mem::take(&mut self.variable_clauses[var.index0()]);

        for id in stale {
            self.clauses.get_mut(id).assign(&self.assignment);
            let (clause_state, head_var, tail_var) = self.clauses.get(id).state(&self.assignment);

            if matches!(clause_state, ClauseState::Unresolved | ClauseState::Unit) {
                self.variable_clauses[head_var.index0()].insert(id);
                self.variable_clauses[tail_var.index0()].insert(id);
            }
            if clause_state == ClauseState::Unsatisfied {
                state = FormulaState::Unsatisfied;
            }

            self.mutation_history[level].insert(id);

            if clause_state == ClauseState::Unit {
                if self.unit_clauses.insert(id) {
                    self.unit_queue.push_back(id);
                }
            } else {
                self.unit_clauses.remove(&id);
            }

            if clause_state == ClauseState::Unsatisfied {
                self.unsat_clauses.insert(id);
            } else {
                self.unsat_clauses.remove(&id);
            }
        }

        if self.assignment.unassigned_count() == 0 && state == FormulaState::Unresolved {
            state = FormulaState::Satisfied;
        }
        *self.state_history.last_mut().unwrap() = state;
    }

    pub fn backtrack(&mut self, d: usize) {
        self.decision_level = d;
        self.state_history.truncate(d + 1);
        self.assignment.backtrack(d);

        while self.mutation_history.len() > d + 1 {
            let touched = self.mutation_history.pop().unwrap();
            for id in touched {
                let (old_head, old_tail) = self.clauses.get(id).head_tail_var();
                self.variable_clauses[old_head.index0()].remove(&id);
                self.variable_clauses[old_tail.index0()].remove(&id);

                self.clauses.get_mut(id).backtrack(d);
                let (state, head_var, tail_var) = self.clauses.get(id).state(&self.assignment);

                match state {
                    ClauseState::Unresolved => {
                        self.variable_clauses[head_var.index0()].insert(id);
                        self.variable_clauses[tail_var.index0()].insert(id);
                    }
                    ClauseState::Unit => {
                        self.variable_clauses[head_var.index0()].insert(id);
                    }
                    _ => {}
                }

                if state == ClauseState::Unit {
                    if self.unit_clauses.insert(id) {
                        self.unit_queue.push_back(id);
                    }
                } else {
                    self.unit_clauses.remove(&id);
                }

                if state == ClauseState::Unsatisfied {
                    self.unsat_clauses.insert(id);
                } else {
                    self.unsat_clauses.remove(&id);
                }
            }
        }
    }

    pub fn get_current_state(&self) -> FormulaState {
        if self.base_state == FormulaState::Unsatisfied {
            return FormulaState::Unsatisfied;
        }
        *self.state_history.last().unwrap()
    }

    /// Pop the next still-unit clause off the FIFO queue, skipping entries
    /// that have since stopped being unit (spec §9: a deterministic,
    /// implementation-chosen order, documented here as FIFO).
    pub fn take_next_unit_clause(&mut self) -> Option<ClauseId> {
        while let Some(id) = self.unit_queue.pop_front() {
            if self.unit_clauses.contains(&id) {
                return Some(id);
            }
        }
        None
    }

    pub fn unsat_clause_ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.unsat_clauses.iter().copied()
    }

    pub fn decision_level(&self) -> usize {
        self.decision_level
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn clause(&self, id: ClauseId) -> &Clause {
        self.clauses.get(id)
    }

    pub fn num_vars(&self) -> usize {
        self.assignment.num_vars()
    }

    pub fn clauses(&self) -> &ClauseArena {
        &self.clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimacs::parse_cnf;

    fn formula(text: &str) -> Formula {
        Formula::new(parse_cnf(text).unwrap())
    }

    #[test]
    fn empty_formula_is_satisfied() {
        let f = formula("p cnf 0 0\n");
        assert_eq!(f.get_current_state(), FormulaState::Satisfied);
    }

    #[test]
    fn empty_clause_is_unsatisfied() {
        let f = formula("p cnf 1 1\n0\n");
        assert_eq!(f.get_current_state(), FormulaState::Unsatisfied);
    }

    #[test]
    fn unit_clauses_are_indexed_at_construction() {
        let f = formula("p cnf 2 2\n1 0\n1 -2 0\n");
        assert!(f.unit_clauses.len() == 1 || f.unit_clauses.len() == 2);
    }

    #[test]
    fn assign_propagates_watch_state_into_unsat_set() {
        let mut f = formula("p cnf 2 1\n1 2 0\n");
        f.assign(1, VarId::new(1), Value::False, None);
        assert_eq!(f.get_current_state(), FormulaState::Unresolved);
        f.assign(1, VarId::new(2), Value::False, None);
        assert_eq!(f.get_current_state(), FormulaState::Unsatisfied);
        assert_eq!(f.unsat_clause_ids().count(), 1);
    }

    #[test]
    fn backtrack_undoes_unsat_and_restores_watches() {
        let mut f = formula("p cnf 2 1\n1 2 0\n");
        f.assign(1, VarId::new(1), Value::False, None);
        f.assign(1, VarId::new(2), Value::False, None);
        assert_eq!(f.get_current_state(), FormulaState::Unsatisfied);

        f.backtrack(0);
        assert_eq!(f.get_current_state(), FormulaState::Unresolved);
        assert_eq!(f.unsat_clause_ids().count(), 0);
    }
}
