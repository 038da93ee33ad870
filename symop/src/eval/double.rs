use crate::error::{DomainViolation, UnboundVariable};
use crate::operator::{BinaryKind, Constant, Operator, ProjectionId, UnaryKind, Variable};
use std::collections::HashMap;
use symop_error::Error;
use super::{DomainPolicy, EvalCtxt, Evaluator};

/// Evaluates expressions to `f64` using the variable values of an [`EvalCtxt`].
///
/// Each projection is evaluated once per evaluator.
#[derive(Debug)]
pub struct DoubleEvaluator<'a> {
    ctxt: &'a EvalCtxt,
    projections: HashMap<ProjectionId, f64>,
}

impl<'a> DoubleEvaluator<'a> {
    /// Creates an evaluator over the given context.
    pub fn new(ctxt: &'a EvalCtxt) -> Self {
        Self { ctxt, projections: HashMap::new() }
    }

    fn unary(&self, kind: UnaryKind, x: f64) -> Result<f64, Error> {
        if self.ctxt.policy == DomainPolicy::Reject && !kind.in_domain(x) {
            return Err(Error::unlocated(DomainViolation { function: kind.symbol(), value: x }));
        }
        Ok(kind.apply(x))
    }

    fn binary(&self, kind: BinaryKind, a: f64, b: f64) -> Result<f64, Error> {
        if self.ctxt.policy == DomainPolicy::Reject && !kind.in_domain(a, b) {
            let function = match kind {
                BinaryKind::Quotient => "division",
                BinaryKind::Power => "pow",
                kind => kind.symbol(),
            };
            let value = if kind == BinaryKind::Quotient { b } else { a };
            return Err(Error::unlocated(DomainViolation { function, value }));
        }
        Ok(kind.apply(a, b))
    }
}

impl Evaluator for DoubleEvaluator<'_> {
    type Output = f64;
    type Error = Error;

    fn constant(&mut self, constant: &Constant) -> Result<f64, Error> {
        Ok(constant.value)
    }

    fn variable(&mut self, variable: &Variable) -> Result<f64, Error> {
        self.ctxt.get_var(variable.index).ok_or_else(|| {
            Error::unlocated(UnboundVariable {
                index: variable.index,
                name: variable.name.clone(),
            })
        })
    }

    fn sin(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Sin, x)
    }

    fn cos(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Cos, x)
    }

    fn tan(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Tan, x)
    }

    fn asin(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Asin, x)
    }

    fn acos(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Acos, x)
    }

    fn atan(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Atan, x)
    }

    fn exp(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Exp, x)
    }

    fn log(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Log, x)
    }

    fn sqrt(&mut self, x: f64) -> Result<f64, Error> {
        self.unary(UnaryKind::Sqrt, x)
    }

    fn powi(&mut self, x: f64, n: i32) -> Result<f64, Error> {
        self.unary(UnaryKind::PowerInt(n), x)
    }

    fn add(&mut self, a: f64, b: f64) -> Result<f64, Error> {
        Ok(a + b)
    }

    fn sub(&mut self, a: f64, b: f64) -> Result<f64, Error> {
        Ok(a - b)
    }

    fn mul(&mut self, a: f64, b: f64) -> Result<f64, Error> {
        Ok(a * b)
    }

    fn div(&mut self, a: f64, b: f64) -> Result<f64, Error> {
        self.binary(BinaryKind::Quotient, a, b)
    }

    fn pow(&mut self, a: f64, b: f64) -> Result<f64, Error> {
        self.binary(BinaryKind::Power, a, b)
    }

    fn projection(&mut self, id: ProjectionId, value: f64) -> Result<f64, Error> {
        self.projections.insert(id, value);
        Ok(value)
    }

    fn lookup_projection(&mut self, id: ProjectionId) -> Option<f64> {
        self.projections.get(&id).copied()
    }
}

impl Operator {
    /// Evaluates the expression to an `f64`, using the variable values in `ctxt`.
    ///
    /// Fails if a variable has no value, or if `ctxt` uses [`DomainPolicy::Reject`] and a function
    /// is applied outside its domain. The span of the error points at the failing subexpression
    /// in `self.to_string()`.
    pub fn eval_f64(&self, ctxt: &EvalCtxt) -> Result<f64, Error> {
        self.evaluate_located(&mut DoubleEvaluator::new(ctxt))
    }
}
