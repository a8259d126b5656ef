//! Boolean constraint propagation on top of [`Formula`] (spec §4.4). Ported
//! from the original `propagating_formula.py`.

use crate::assignment::Assignment;
use crate::clause::ClauseId;
use crate::dimacs::parse_cnf;
use crate::error::DimacsError;
use crate::formula::{Formula, FormulaState};
use crate::lit::{satisfying_value, VarId};

pub struct PropagatingFormula {
    formula: Formula,
    decision_level: usize,
}

impl PropagatingFormula {
    pub fn from_dimacs(input: &str) -> Result<PropagatingFormula, DimacsError> {
        let parsed = parse_cnf(input)?;
        let formula = Formula::new(parsed);
        let mut pf = PropagatingFormula {
            formula,
            decision_level: 0,
        };
        pf.propagate();
        Ok(pf)
    }

    /// Repeatedly assign the forced literal of any unit clause until none
    /// remain or the formula resolves.
    fn propagate(&mut self) {
        while self.formula.get_current_state() == FormulaState::Unresolved {
            let Some(id) = self.formula.take_next_unit_clause() else {
                break;
            };
            let (head_lit, _) = self.formula.clause(id).head_tail_lit();
            let var = VarId::from_lit(head_lit);
            let value = satisfying_value(head_lit);
            self.formula
                .assign(self.decision_level, var, value, Some(id));
        }
    }

    /// The decision entry point: bump the level, record the decision, and
    /// propagate its consequences.
    pub fn decide(&mut self, var: VarId, value: crate::lit::Value) {
        self.decision_level += 1;
        self.formula.assign(self.decision_level, var, value, None);
        self.propagate();
    }

    pub fn add_clause(&mut self, literals: Vec<i64>) -> ClauseId {
        let id = self.formula.add_clause(literals);
        self.propagate();
        id
    }

    pub fn backtrack(&mut self, d: usize) {
        self.decision_level = d;
        self.formula.backtrack(d);
    }

    pub fn get_current_state(&self) -> FormulaState {
        self.formula.get_current_state()
    }

    pub fn decision_level(&self) -> usize {
        self.decision_level
    }

    pub fn assignment(&self) -> &Assignment {
        self.formula.assignment()
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}
