//! Evaluation of expressions through a visitor.
//!
//! [`Operator::evaluate`] walks the expression in post-order and hands the already-evaluated
//! children of each node to the [`Evaluator`] method for the node's kind. The number system is
//! entirely up to the evaluator: this crate provides [`DoubleEvaluator`] for plain `f64`
//! evaluation and [`IntervalEvaluator`] for computing enclosures.

mod ctxt;
mod double;
mod interval;

pub use ctxt::{DomainPolicy, EvalCtxt};
pub use double::DoubleEvaluator;
pub use interval::{Interval, IntervalEvaluator};

use crate::operator::{BinaryKind, Constant, Operator, ProjectionId, UnaryKind, Variable};
use symop_error::Error;

/// A visitor that computes a value for every node of an expression.
///
/// Each method receives the values of the node's children and returns the value of the node, or
/// an error, which stops the evaluation and is returned unchanged from [`Operator::evaluate`].
pub trait Evaluator {
    /// The value computed for each node.
    type Output: Clone;

    /// The error raised when a node cannot be evaluated.
    type Error;

    fn constant(&mut self, constant: &Constant) -> Result<Self::Output, Self::Error>;
    fn variable(&mut self, variable: &Variable) -> Result<Self::Output, Self::Error>;

    fn sin(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn cos(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn tan(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn asin(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn acos(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn atan(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn exp(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn log(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn sqrt(&mut self, x: Self::Output) -> Result<Self::Output, Self::Error>;
    fn powi(&mut self, x: Self::Output, n: i32) -> Result<Self::Output, Self::Error>;

    fn add(&mut self, a: Self::Output, b: Self::Output) -> Result<Self::Output, Self::Error>;
    fn sub(&mut self, a: Self::Output, b: Self::Output) -> Result<Self::Output, Self::Error>;
    fn mul(&mut self, a: Self::Output, b: Self::Output) -> Result<Self::Output, Self::Error>;
    fn div(&mut self, a: Self::Output, b: Self::Output) -> Result<Self::Output, Self::Error>;
    fn pow(&mut self, a: Self::Output, b: Self::Output) -> Result<Self::Output, Self::Error>;

    /// Called with the value of a projection's expression, the first time the projection is
    /// evaluated. Evaluators that memoize projections store the value here.
    fn projection(
        &mut self,
        _id: ProjectionId,
        value: Self::Output,
    ) -> Result<Self::Output, Self::Error> {
        Ok(value)
    }

    /// Returns the memoized value of a projection, if any. When this returns a value, the
    /// projection's expression is not evaluated again.
    fn lookup_projection(&mut self, _id: ProjectionId) -> Option<Self::Output> {
        None
    }
}

fn apply_unary<E: Evaluator>(
    evaluator: &mut E,
    kind: UnaryKind,
    x: E::Output,
) -> Result<E::Output, E::Error> {
    match kind {
        UnaryKind::Sin => evaluator.sin(x),
        UnaryKind::Cos => evaluator.cos(x),
        UnaryKind::Tan => evaluator.tan(x),
        UnaryKind::Asin => evaluator.asin(x),
        UnaryKind::Acos => evaluator.acos(x),
        UnaryKind::Atan => evaluator.atan(x),
        UnaryKind::Exp => evaluator.exp(x),
        UnaryKind::Log => evaluator.log(x),
        UnaryKind::Sqrt => evaluator.sqrt(x),
        UnaryKind::PowerInt(n) => evaluator.powi(x, n),
    }
}

fn apply_binary<E: Evaluator>(
    evaluator: &mut E,
    kind: BinaryKind,
    a: E::Output,
    b: E::Output,
) -> Result<E::Output, E::Error> {
    match kind {
        BinaryKind::Addition => evaluator.add(a, b),
        BinaryKind::Subtraction => evaluator.sub(a, b),
        BinaryKind::Product => evaluator.mul(a, b),
        BinaryKind::Quotient => evaluator.div(a, b),
        BinaryKind::Power => evaluator.pow(a, b),
    }
}

impl Operator {
    /// Evaluates the expression with the given evaluator.
    pub fn evaluate<E: Evaluator>(&self, evaluator: &mut E) -> Result<E::Output, E::Error> {
        match self {
            Self::Constant(constant) => evaluator.constant(constant),
            Self::Variable(variable) => evaluator.variable(variable),
            Self::Unary(unary) => {
                let x = unary.arg().evaluate(evaluator)?;
                apply_unary(evaluator, unary.kind(), x)
            },
            Self::Binary(binary) => {
                let a = binary.lhs().evaluate(evaluator)?;
                let b = binary.rhs().evaluate(evaluator)?;
                apply_binary(evaluator, binary.kind(), a, b)
            },
            Self::Projection(projection) => {
                if let Some(value) = evaluator.lookup_projection(projection.id()) {
                    return Ok(value);
                }
                let value = projection.expr().evaluate(evaluator)?;
                evaluator.projection(projection.id(), value)
            },
        }
    }

    /// Evaluates the expression with an evaluator that raises [`Error`]s, and points each error
    /// at the failing subexpression.
    ///
    /// The span of the error is the byte range of the failing node in the rendered expression
    /// (`self.to_string()`). An error raised inside a projection points at the projection.
    pub fn evaluate_located<E>(&self, evaluator: &mut E) -> Result<E::Output, Error>
    where
        E: Evaluator<Error = Error>,
    {
        self.evaluate_at(evaluator, 0).map(|(value, _)| value)
    }

    /// Evaluates the node rendered at byte `start`, returning its value and the length of its
    /// rendered text.
    fn evaluate_at<E>(&self, evaluator: &mut E, start: usize) -> Result<(E::Output, usize), Error>
    where
        E: Evaluator<Error = Error>,
    {
        match self {
            Self::Constant(constant) => {
                let len = constant.to_string().len();
                let value = evaluator.constant(constant).map_err(|err| locate(err, start, len))?;
                Ok((value, len))
            },
            Self::Variable(variable) => {
                let len = variable.to_string().len();
                let value = evaluator.variable(variable).map_err(|err| locate(err, start, len))?;
                Ok((value, len))
            },
            Self::Unary(unary) => {
                let kind = unary.kind();
                let (prefix, suffix) = match kind {
                    UnaryKind::PowerInt(n) => (0, 1 + n.to_string().len()),
                    kind => (kind.symbol().len() + 1, 1),
                };
                let (x, arg_len) = unary.arg().evaluate_at(evaluator, start + prefix)?;
                let len = prefix + arg_len + suffix;
                let value = apply_unary(evaluator, kind, x).map_err(|err| locate(err, start, len))?;
                Ok((value, len))
            },
            Self::Binary(binary) => {
                let kind = binary.kind();
                let (open, separator, close) = match kind {
                    BinaryKind::Power => (0, 1, 0),
                    BinaryKind::Product | BinaryKind::Quotient => (1, 1, 1),
                    BinaryKind::Addition | BinaryKind::Subtraction => (1, 3, 1),
                };
                let (a, lhs_len) = binary.lhs().evaluate_at(evaluator, start + open)?;
                let (b, rhs_len) = binary
                    .rhs()
                    .evaluate_at(evaluator, start + open + lhs_len + separator)?;
                let len = open + lhs_len + separator + rhs_len + close;
                let value = apply_binary(evaluator, kind, a, b)
                    .map_err(|err| locate(err, start, len))?;
                Ok((value, len))
            },
            Self::Projection(projection) => {
                let len = projection.to_string().len();
                if let Some(value) = evaluator.lookup_projection(projection.id()) {
                    return Ok((value, len));
                }
                let value = projection
                    .expr()
                    .evaluate(evaluator)
                    .and_then(|value| evaluator.projection(projection.id(), value))
                    .map_err(|err| err.with_spans(|| vec![start..start + len]))?;
                Ok((value, len))
            },
        }
    }
}

/// Points an error raised by a node at the node, unless a child already located it.
fn locate(err: Error, start: usize, len: usize) -> Error {
    err.with_spans(|| vec![start..start + len])
}
