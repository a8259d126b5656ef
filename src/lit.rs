//! Literal, variable and truth-value types shared across the solver.
//!
//! Literals are represented with [`dimacs::Lit`], the same type the teacher
//! crate's `cnf` module already depends on. Variables are re-keyed into a
//! dense, zero-based [`VarId`] so that the rest of the solver can use plain
//! `Vec`-indexed storage instead of hashing a foreign type.

use dimacs::{Lit, Sign};
use std::fmt;

/// A dense variable identifier, 1-based to match DIMACS numbering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

impl VarId {
    pub fn new(n: usize) -> VarId {
        debug_assert!(n > 0, "variables are 1-indexed");
        VarId(n)
    }

    pub fn from_lit(lit: Lit) -> VarId {
        VarId(lit.var().to_u64() as usize)
    }

    /// Zero-based index into `Vec`s sized by variable count.
    pub fn index0(self) -> usize {
        self.0 - 1
    }

    pub fn pos_lit(self) -> Lit {
        Lit::from_i64(self.0 as i64)
    }

    pub fn neg_lit(self) -> Lit {
        Lit::from_i64(-(self.0 as i64))
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The truth value assigned to a variable. Unassigned is modelled as
/// `Option<Value>` rather than a third tag, following the spec's note that a
/// tagged sum is preferable to the `z2no` numeric encoding trick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Value {
    False,
    True,
}

impl Value {
    pub fn from_sign(sign: Sign) -> Value {
        match sign {
            Sign::Pos => Value::True,
            Sign::Neg => Value::False,
        }
    }

    pub fn negate(self) -> Value {
        match self {
            Value::True => Value::False,
            Value::False => Value::True,
        }
    }
}

pub fn is_positive(lit: Lit) -> bool {
    lit.sign() == Sign::Pos
}

/// Whether `lit` is made true by `value` (`None` means unassigned).
pub fn literal_satisfied(lit: Lit, value: Option<Value>) -> bool {
    match value {
        Some(Value::True) => is_positive(lit),
        Some(Value::False) => !is_positive(lit),
        None => false,
    }
}

/// Whether `lit` is made false by `value` (`None` means unassigned).
pub fn literal_falsified(lit: Lit, value: Option<Value>) -> bool {
    match value {
        Some(Value::True) => !is_positive(lit),
        Some(Value::False) => is_positive(lit),
        None => false,
    }
}

/// The value that would make `lit` true, for use when propagating a unit
/// clause's sole unassigned literal.
pub fn satisfying_value(lit: Lit) -> Value {
    if is_positive(lit) {
        Value::True
    } else {
        Value::False
    }
}
