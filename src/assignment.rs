//! The partial-assignment trail (spec §3, §4.1). Grounded on the teacher's
//! `assignment.rs` (`Vec<Option<bool>>`-backed assignment) generalized to
//! carry decision levels and antecedents, per the original `assignment.py`.

use fixedbitset::FixedBitSet;

use crate::clause::ClauseId;
use crate::lit::{Value, VarId};

/// `(level, variable, value, antecedent)`. `antecedent` is `None` for a
/// decision and `Some(clause)` for a propagated assignment.
#[derive(Clone, Copy, Debug)]
pub struct AssignmentItem {
    pub level: usize,
    pub var: VarId,
    pub value: Value,
    pub antecedent: Option<ClauseId>,
}

/// The assignment trail: `current` is keyed by variable, `history` is the
/// append-only causal order used by backtrack.
pub struct Assignment {
    current: Vec<Option<AssignmentItem>>,
    history: Vec<AssignmentItem>,
    unassigned: FixedBitSet,
    num_vars: usize,
}

impl Assignment {
    pub fn new(num_vars: usize) -> Assignment {
        let mut unassigned = FixedBitSet::with_capacity(num_vars);
        unassigned.set_range(.., true);
        Assignment {
            current: vec![None; num_vars],
            history: Vec::new(),
            unassigned,
            num_vars,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Append a new assignment. Precondition: `var` is unassigned.
    pub fn add(&mut self, level: usize, var: VarId, value: Value, antecedent: Option<ClauseId>) {
        debug_assert!(self.current[var.index0()].is_none());
        let item = AssignmentItem {
            level,
            var,
            value,
            antecedent,
        };
        self.current[var.index0()] = Some(item);
        self.unassigned.set(var.index0(), false);
        self.history.push(item);
    }

    /// Undo every assignment made at a decision level greater than `d`.
    pub fn backtrack(&mut self, d: usize) {
        while let Some(item) = self.history.last().copied() {
            if item.level <= d {
                break;
            }
            self.history.pop();
            self.current[item.var.index0()] = None;
            self.unassigned.set(item.var.index0(), true);
        }
    }

    pub fn value_of(&self, var: VarId) -> Option<Value> {
        self.current[var.index0()].map(|item| item.value)
    }

    pub fn item_of(&self, var: VarId) -> Option<AssignmentItem> {
        self.current[var.index0()]
    }

    pub fn is_unassigned(&self, var: VarId) -> bool {
        self.current[var.index0()].is_none()
    }

    pub fn unassigned_count(&self) -> usize {
        self.unassigned.count_ones(..)
    }

    pub fn unassigned_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.unassigned.ones().map(|idx| VarId::new(idx + 1))
    }

    pub fn history(&self) -> &[AssignmentItem] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_backtrack_restores_unassigned() {
        let mut a = Assignment::new(3);
        a.add(1, VarId::new(1), Value::True, None);
        a.add(1, VarId::new(2), Value::False, None);
        a.add(2, VarId::new(3), Value::True, None);
        assert_eq!(a.len(), 3);

        a.backtrack(1);
        assert_eq!(a.len(), 2);
        assert!(a.is_unassigned(VarId::new(3)));
        assert_eq!(a.value_of(VarId::new(1)), Some(Value::True));
    }

    #[test]
    fn backtrack_is_idempotent_under_replay() {
        let mut a = Assignment::new(3);
        a.add(1, VarId::new(1), Value::True, None);
        a.add(2, VarId::new(2), Value::False, None);
        a.add(2, VarId::new(3), Value::True, None);

        a.backtrack(1);
        a.add(2, VarId::new(2), Value::False, None);
        a.add(2, VarId::new(3), Value::True, None);

        assert_eq!(a.len(), 3);
        assert_eq!(a.value_of(VarId::new(2)), Some(Value::False));
        assert_eq!(a.value_of(VarId::new(3)), Some(Value::True));
    }

    use proptest::prelude::*;

    proptest! {
        /// Spec §8 property 3 (backtrack idempotence), generalized: for any
        /// trail with one assignment per level and any cut level, undoing
        /// everything above the cut and replaying the same suffix reproduces
        /// the original values.
        #[test]
        fn backtrack_then_replay_reproduces_state(
            values in prop::collection::vec(any::<bool>(), 1..8),
            cut in 0usize..8,
        ) {
            let n = values.len();
            let cut = cut.min(n);
            let as_value = |b: bool| if b { Value::True } else { Value::False };

            let mut a = Assignment::new(n);
            for (i, &v) in values.iter().enumerate() {
                a.add(i + 1, VarId::new(i + 1), as_value(v), None);
            }

            a.backtrack(cut);
            for (i, &v) in values.iter().enumerate().skip(cut) {
                a.add(i + 1, VarId::new(i + 1), as_value(v), None);
            }

            prop_assert_eq!(a.len(), n);
            for (i, &v) in values.iter().enumerate() {
                prop_assert_eq!(a.value_of(VarId::new(i + 1)), Some(as_value(v)));
            }
        }
    }
}
