#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An independent variable of an expression.
///
/// The `index` identifies the variable everywhere in the engine: it is the argument of
/// [`Operator::differentiate`], the row of the forward seeds and the slot of the reverse-mode
/// accumulator.
///
/// [`Operator::differentiate`]: crate::Operator::differentiate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variable {
    /// The index of the variable.
    pub index: usize,

    /// An optional name used when rendering expressions.
    pub name: Option<String>,
}

impl Variable {
    /// Creates an unnamed variable, rendered as `x{index}`.
    pub fn new(index: usize) -> Self {
        Self { index, name: None }
    }

    /// Creates a named variable.
    pub fn named(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: Some(name.into()) }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "x{}", self.index),
        }
    }
}
