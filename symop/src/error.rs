//! Errors raised while evaluating expressions.

use ariadne::{Fmt, Report};
use std::ops::Range;
use symop_error::{build_report, ErrorKind, EXPR};

/// The evaluation context has no value for a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundVariable {
    /// The index of the variable.
    pub index: usize,

    /// The display name of the variable, if it has one.
    pub name: Option<String>,
}

impl ErrorKind for UnboundVariable {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'a, (&'a str, Range<usize>)> {
        let shown = match &self.name {
            Some(name) => format!("`{}` (index {})", name, self.index),
            None => format!("`x{}`", self.index),
        };
        build_report(
            src_id,
            spans,
            format!("no value was given for the variable {}", shown),
            ["this variable".to_string()],
            Some(format!(
                "add it to the context with: {}",
                format!("ctxt.add_var({}, <value>)", self.index).fg(EXPR),
            )),
        )
    }
}

/// A function was applied outside its real domain while the context rejects such values.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainViolation {
    /// The name of the function, such as `log`.
    pub function: &'static str,

    /// The offending argument. For functions of two arguments, the first one.
    pub value: f64,
}

impl ErrorKind for DomainViolation {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'a, (&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            format!("`{}` is not defined at {}", self.function, self.value),
            [format!("this evaluates `{}` outside its domain", self.function)],
            Some("use `DomainPolicy::Propagate` to get NaN or infinite values instead".to_string()),
        )
    }
}

/// A row of a seed matrix has the wrong number of directions.
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedSeedRow {
    /// The index of the row.
    pub row: usize,

    /// The number of entries in the row.
    pub len: usize,

    /// The number of directions of the matrix.
    pub directions: usize,
}

impl ErrorKind for RaggedSeedRow {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'a, (&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            format!(
                "seed row {} has {} entries, expected {}",
                self.row, self.len, self.directions,
            ),
            std::iter::empty(),
            Some("give every row one tangent per direction, using zero for no tangent".to_string()),
        )
    }
}
