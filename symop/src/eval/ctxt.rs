use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// What to do when a function is applied outside its real domain, such as `log(-1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[repr(u8)]
pub enum DomainPolicy {
    /// Return whatever the floating-point function returns (usually NaN or an infinity) and keep
    /// evaluating.
    #[default]
    Propagate,

    /// Stop with a [`DomainViolation`](crate::error::DomainViolation) error.
    Reject,
}

impl std::fmt::Display for DomainPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainPolicy::Propagate => write!(f, "propagate"),
            DomainPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// A context to use when evaluating an expression, containing the values of its variables.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvalCtxt {
    /// The variable values, by index.
    vars: HashMap<usize, f64>,

    /// How out-of-domain function arguments are handled.
    pub policy: DomainPolicy,
}

impl EvalCtxt {
    /// Creates a new context with no variables.
    pub fn new() -> EvalCtxt {
        EvalCtxt::default()
    }

    /// Sets the domain policy of the context.
    pub fn with_policy(mut self, policy: DomainPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a variable to the context.
    pub fn add_var(&mut self, index: usize, value: f64) {
        self.vars.insert(index, value);
    }

    /// Get the value of a variable in the context.
    pub fn get_var(&self, index: usize) -> Option<f64> {
        self.vars.get(&index).copied()
    }

    /// Returns the variables in the context.
    pub fn get_vars(&self) -> &HashMap<usize, f64> {
        &self.vars
    }
}

impl FromIterator<(usize, f64)> for EvalCtxt {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().collect(), policy: DomainPolicy::default() }
    }
}
