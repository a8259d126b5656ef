//! Clauses with lazy head/tail watches (spec §3, §4.2).
//!
//! Ported from the original `clause.py`'s `reference_history` scheme: each
//! clause keeps a stack of `(level, head, tail)` triples, the current top
//! entry locates the two watched literals, and `backtrack` simply pops
//! entries above a level. Clauses are stored in a [`ClauseArena`] and
//! referenced by stable [`ClauseId`] (spec §9: "never use structural equality
//! on clauses as a map key").

use dimacs::Lit;

use crate::assignment::Assignment;
use crate::lit::{literal_falsified, literal_satisfied, VarId};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClauseId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClauseState {
    Satisfied,
    Unsatisfied,
    Unit,
    Unresolved,
}

/// A disjunction of literals, immutable except for its watch history.
#[derive(Debug)]
pub struct Clause {
    literals: Box<[Lit]>,
    /// Stack of `(level, head, tail)`; the last entry is current.
    reference_history: Vec<(usize, usize, usize)>,
}

impl Clause {
    pub fn new(literals: Vec<Lit>) -> Clause {
        assert!(!literals.is_empty(), "clauses must be non-empty");
        let tail = literals.len() - 1;
        Clause {
            literals: literals.into_boxed_slice(),
            reference_history: vec![(0, 0, tail)],
        }
    }

    pub fn literals(&self) -> &[Lit] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.literals.iter().map(|&lit| VarId::from_lit(lit))
    }

    /// Variables of this clause that currently have an assignment.
    pub fn assigned_vars(&self, assignment: &Assignment) -> Vec<VarId> {
        self.vars()
            .filter(|&v| assignment.item_of(v).is_some())
            .collect()
    }

    fn update_history(&mut self, level: usize, head: usize, tail: usize) {
        let max_seen = self.reference_history.last().unwrap().0;
        if level <= max_seen {
            *self.reference_history.last_mut().unwrap() = (max_seen, head, tail);
        } else {
            self.reference_history.push((level, head, tail));
        }
    }

    /// Advance the watches inward past literals the trail falsifies. See
    /// spec §4.2: both pointers migrate toward each other rather than
    /// swapping into an unwatched slot.
    pub fn assign(&mut self, assignment: &Assignment) {
        let (_, mut head, mut tail) = *self.reference_history.last().unwrap();

        while head < tail {
            let head_lit = self.literals[head];
            match assignment.item_of(VarId::from_lit(head_lit)) {
                Some(item) if literal_falsified(head_lit, Some(item.value)) => {
                    head += 1;
                    self.update_history(item.level, head, tail);
                }
                _ => break,
            }
        }

        while head < tail {
            let tail_lit = self.literals[tail];
            match assignment.item_of(VarId::from_lit(tail_lit)) {
                Some(item) if literal_falsified(tail_lit, Some(item.value)) => {
                    tail -= 1;
                    self.update_history(item.level, head, tail);
                }
                _ => break,
            }
        }
    }

    /// Restore the watch configuration that was current at level `d`.
    pub fn backtrack(&mut self, d: usize) {
        while self.reference_history.last().unwrap().0 > d {
            self.reference_history.pop();
        }
    }

    pub fn head_tail_var(&self) -> (VarId, VarId) {
        let (_, head, tail) = *self.reference_history.last().unwrap();
        (
            VarId::from_lit(self.literals[head]),
            VarId::from_lit(self.literals[tail]),
        )
    }

    pub fn head_tail_lit(&self) -> (Lit, Lit) {
        let (_, head, tail) = *self.reference_history.last().unwrap();
        (self.literals[head], self.literals[tail])
    }

    pub fn state(&self, assignment: &Assignment) -> (ClauseState, VarId, VarId) {
        let (_, head, tail) = *self.reference_history.last().unwrap();
        let head_lit = self.literals[head];
        let tail_lit = self.literals[tail];
        let head_var = VarId::from_lit(head_lit);
        let tail_var = VarId::from_lit(tail_lit);
        let head_val = assignment.value_of(head_var);
        let tail_val = assignment.value_of(tail_var);

        if literal_satisfied(head_lit, head_val) || literal_satisfied(tail_lit, tail_val) {
            return (ClauseState::Satisfied, head_var, tail_var);
        }
        if head == tail {
            if literal_falsified(head_lit, head_val) {
                return (ClauseState::Unsatisfied, head_var, tail_var);
            }
            return (ClauseState::Unit, head_var, tail_var);
        }
        (ClauseState::Unresolved, head_var, tail_var)
    }
}

/// Owns every clause (original and learned) and hands out stable ids. The
/// arena-with-index pattern is the substrate spec §9 recommends in place of
/// structural clause equality.
#[derive(Default)]
pub struct ClauseArena {
    clauses: Vec<Clause>,
}

impl ClauseArena {
    pub fn new() -> ClauseArena {
        ClauseArena {
            clauses: Vec::new(),
        }
    }

    pub fn push(&mut self, clause: Clause) -> ClauseId {
        let id = ClauseId(self.clauses.len());
        self.clauses.push(clause);
        id
    }

    pub fn get(&self, id: ClauseId) -> &Clause {
        &self.clauses[id.0]
    }

    pub fn get_mut(&mut self, id: ClauseId) -> &mut Clause {
        &mut self.clauses[id.0]
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &Clause)> {
        self.clauses
            .iter()
            .enumerate()
            .map(|(i, c)| (ClauseId(i), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lit::Value;

    fn lits(xs: &[i64]) -> Vec<Lit> {
        xs.iter().map(|&x| Lit::from_i64(x)).collect()
    }

    #[test]
    fn unresolved_until_watches_collapse() {
        let clause = Clause::new(lits(&[1, 2, 3]));
        let assignment = Assignment::new(3);
        let (state, ..) = clause.state(&assignment);
        assert_eq!(state, ClauseState::Unresolved);
    }

    #[test]
    fn becomes_unit_when_all_but_one_falsified() {
        let mut clause = Clause::new(lits(&[1, 2, 3]));
        let mut assignment = Assignment::new(3);
        assignment.add(1, VarId::new(1), Value::False, None);
        clause.assign(&assignment);
        assignment.add(1, VarId::new(2), Value::False, None);
        clause.assign(&assignment);

        let (state, head, tail) = clause.state(&assignment);
        assert_eq!(state, ClauseState::Unit);
        assert_eq!(head, VarId::new(3));
        assert_eq!(tail, VarId::new(3));
    }

    #[test]
    fn becomes_unsatisfied_when_all_falsified() {
        let mut clause = Clause::new(lits(&[1, -2]));
        let mut assignment = Assignment::new(2);
        assignment.add(1, VarId::new(1), Value::False, None);
        clause.assign(&assignment);
        assignment.add(1, VarId::new(2), Value::True, None);
        clause.assign(&assignment);

        let (state, ..) = clause.state(&assignment);
        assert_eq!(state, ClauseState::Unsatisfied);
    }

    #[test]
    fn satisfied_short_circuits_before_collapse() {
        let mut clause = Clause::new(lits(&[1, 2, 3]));
        let mut assignment = Assignment::new(3);
        assignment.add(1, VarId::new(1), Value::True, None);
        clause.assign(&assignment);

        let (state, ..) = clause.state(&assignment);
        assert_eq!(state, ClauseState::Satisfied);
    }

    #[test]
    fn assign_then_backtrack_restores_state() {
        let mut clause = Clause::new(lits(&[1, 2, 3, 4]));
        let mut assignment = Assignment::new(4);

        assignment.add(1, VarId::new(1), Value::False, None);
        clause.assign(&assignment);
        assignment.add(2, VarId::new(2), Value::False, None);
        clause.assign(&assignment);
        assignment.add(3, VarId::new(4), Value::False, None);
        clause.assign(&assignment);

        clause.backtrack(2);
        assignment.backtrack(2);

        // Replay a fresh clause from scratch against the same trail and
        // compare: backtrack must reproduce exactly this state.
        let mut fresh = Clause::new(lits(&[1, 2, 3, 4]));
        fresh.assign(&assignment);
        assert_eq!(fresh.head_tail_var(), clause.head_tail_var());
        assert_eq!(fresh.state(&assignment).0, clause.state(&assignment).0);
    }
}
