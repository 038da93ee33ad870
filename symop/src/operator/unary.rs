//! Functions of one argument.
//!
//! Every [`UnaryKind`] supplies its scalar function, its scalar first and second derivatives, and
//! the symbolic templates of those derivatives. The differentiation passes are written once, in
//! terms of these templates; see [`UnaryKind::chain_rule`].

use crate::curvature::Curvature;
use crate::derivative::build::{product, quotient};
use log::trace;
use super::{NodeCache, Operator, OperatorKind, Simplification};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a [`Unary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryKind {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Log,
    Sqrt,

    /// Raises the argument to a fixed integer power.
    PowerInt(i32),
}

impl UnaryKind {
    /// Returns the display name of the function.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
            Self::PowerInt(_) => "powi",
        }
    }

    /// Returns the [`OperatorKind`] of nodes of this kind.
    pub fn tag(self) -> OperatorKind {
        match self {
            Self::Sin => OperatorKind::Sin,
            Self::Cos => OperatorKind::Cos,
            Self::Tan => OperatorKind::Tan,
            Self::Asin => OperatorKind::Asin,
            Self::Acos => OperatorKind::Acos,
            Self::Atan => OperatorKind::Atan,
            Self::Exp => OperatorKind::Exp,
            Self::Log => OperatorKind::Log,
            Self::Sqrt => OperatorKind::Sqrt,
            Self::PowerInt(_) => OperatorKind::PowerInt,
        }
    }

    /// Applies the function to a number. No domain checks are made: values outside the domain
    /// produce whatever the underlying floating-point function produces.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Sqrt => x.sqrt(),
            Self::PowerInt(n) => x.powi(n),
        }
    }

    /// The first derivative of the function at `x`.
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Self::Sin => x.cos(),
            Self::Cos => -x.sin(),
            Self::Tan => 1.0 / (x.cos() * x.cos()),
            Self::Asin => 1.0 / (1.0 - x * x).sqrt(),
            Self::Acos => -1.0 / (1.0 - x * x).sqrt(),
            Self::Atan => 1.0 / (1.0 + x * x),
            Self::Exp => x.exp(),
            Self::Log => 1.0 / x,
            Self::Sqrt => 0.5 / x.sqrt(),
            Self::PowerInt(0) => 0.0,
            Self::PowerInt(1) => 1.0,
            Self::PowerInt(n) => f64::from(n) * powi_wide(x, i64::from(n) - 1),
        }
    }

    /// The second derivative of the function at `x`.
    pub fn second_derivative(self, x: f64) -> f64 {
        match self {
            Self::Sin => -x.sin(),
            Self::Cos => -x.cos(),
            Self::Tan => 2.0 * x.sin() / x.cos().powi(3),
            Self::Asin => x / (1.0 - x * x).powf(1.5),
            Self::Acos => -x / (1.0 - x * x).powf(1.5),
            Self::Atan => -2.0 * x / (1.0 + x * x).powi(2),
            Self::Exp => x.exp(),
            Self::Log => -1.0 / (x * x),
            Self::Sqrt => -0.25 / x.powf(1.5),
            Self::PowerInt(0) | Self::PowerInt(1) => 0.0,
            Self::PowerInt(2) => 2.0,
            Self::PowerInt(n) => {
                f64::from(n) * (f64::from(n) - 1.0) * powi_wide(x, i64::from(n) - 2)
            },
        }
    }

    /// Returns true if `x` is inside the real domain of the function.
    pub fn in_domain(self, x: f64) -> bool {
        match self {
            Self::Asin | Self::Acos => (-1.0..=1.0).contains(&x),
            Self::Log => x > 0.0,
            Self::Sqrt => x >= 0.0,
            Self::PowerInt(n) if n < 0 => x != 0.0,
            _ => true,
        }
    }

    /// The symbolic first derivative of the function, as an expression of its argument.
    pub fn derivative_template(self, arg: &Operator) -> Operator {
        match self {
            Self::Sin => arg.share().cos(),
            Self::Cos => Operator::constant(-1.0) * arg.share().sin(),
            Self::Tan => arg.share().cos().powi(-2),
            Self::Asin => one_minus_square(arg).pow(Operator::constant(-0.5)),
            Self::Acos => {
                Operator::constant(-1.0) * one_minus_square(arg).pow(Operator::constant(-0.5))
            },
            Self::Atan => one_plus_square(arg).powi(-1),
            Self::Exp => arg.share().exp(),
            Self::Log => arg.share().powi(-1),
            Self::Sqrt => Operator::constant(0.5) * arg.share().pow(Operator::constant(-0.5)),
            Self::PowerInt(n) => scaled_power(arg, f64::from(n), i64::from(n) - 1),
        }
    }

    /// The symbolic second derivative of the function, as an expression of its argument.
    pub fn second_derivative_template(self, arg: &Operator) -> Operator {
        match self {
            Self::Sin => Operator::constant(-1.0) * arg.share().sin(),
            Self::Cos => Operator::constant(-1.0) * arg.share().cos(),
            Self::Tan => Operator::constant(2.0) * (arg.share().sin() * arg.share().cos().powi(-3)),
            Self::Asin => arg.share() * one_minus_square(arg).pow(Operator::constant(-1.5)),
            Self::Acos => {
                Operator::constant(-1.0)
                    * (arg.share() * one_minus_square(arg).pow(Operator::constant(-1.5)))
            },
            Self::Atan => Operator::constant(-2.0) * (arg.share() * one_plus_square(arg).powi(-2)),
            Self::Exp => arg.share().exp(),
            Self::Log => Operator::constant(-1.0) * arg.share().powi(-2),
            Self::Sqrt => Operator::constant(-0.25) * arg.share().pow(Operator::constant(-1.5)),
            Self::PowerInt(n) => {
                scaled_power(arg, f64::from(n) * (f64::from(n) - 1.0), i64::from(n) - 2)
            },
        }
    }

    /// Combines the derivative template with a derivative (or seed) `d` that is known to be
    /// neither zero nor one.
    fn combine(self, arg: &Operator, d: Operator) -> Operator {
        match self {
            Self::Log => quotient(d, arg.share()),
            kind => product(kind.derivative_template(arg), d),
        }
    }

    /// Applies the chain rule: returns the product of the derivative template and `d`, where `d`
    /// is the derivative of the argument (forward) or the incoming seed (reverse).
    ///
    /// - If `d` is tagged zero, the result is the zero constant and the template is never built.
    /// - If `d` is tagged one, the result is the template itself.
    pub fn chain_rule(self, arg: &Operator, d: Operator) -> Operator {
        match d.simplification() {
            Simplification::Zero => {
                trace!("{}: zero derivative, skipping chain rule", self.symbol());
                Operator::zero()
            },
            Simplification::One => {
                trace!("{}: unit derivative, returning template", self.symbol());
                self.derivative_template(arg)
            },
            Simplification::Neither => self.combine(arg, d),
        }
    }

    /// Computes the curvature of `f(arg)` given the curvature of the argument.
    pub fn curvature(self, arg: Curvature) -> Curvature {
        match self {
            Self::Log | Self::Sqrt => arg.compose_nondecreasing(Curvature::Concave),
            Self::Exp => arg.compose_nondecreasing(Curvature::Convex),
            Self::PowerInt(0) => Curvature::Constant,
            Self::PowerInt(1) => arg,
            Self::PowerInt(n) if n > 0 && n % 2 == 0 => match arg {
                Curvature::Constant => Curvature::Constant,
                Curvature::Affine => Curvature::Convex,
                _ => Curvature::Neither,
            },
            _ => match arg {
                Curvature::Constant => Curvature::Constant,
                _ => Curvature::Neither,
            },
        }
    }
}

/// `1 - arg^2`
fn one_minus_square(arg: &Operator) -> Operator {
    Operator::one() - arg.share().powi(2)
}

/// `1 + arg^2`
fn one_plus_square(arg: &Operator) -> Operator {
    Operator::one() + arg.share().powi(2)
}

/// `factor * arg^exponent`, without building nodes for trivial factors or exponents.
///
/// Exponents outside the `i32` range, which only arise from differentiating `powi` near
/// `i32::MIN`, are built as a [`BinaryKind::Power`](super::BinaryKind::Power) with a constant
/// exponent.
fn scaled_power(arg: &Operator, factor: f64, exponent: i64) -> Operator {
    if factor == 0.0 {
        return Operator::zero();
    }
    let power = match exponent {
        0 => return Operator::constant(factor),
        1 => arg.share(),
        n => match i32::try_from(n) {
            Ok(n) => arg.share().powi(n),
            Err(_) => arg.share().pow(Operator::constant(n as f64)),
        },
    };
    product(Operator::constant(factor), power)
}

/// `x^n` for integer exponents that may not fit an `i32`.
fn powi_wide(x: f64, n: i64) -> f64 {
    match i32::try_from(n) {
        Ok(n) => x.powi(n),
        Err(_) => x.powf(n as f64),
    }
}

/// A function applied to one argument.
#[derive(Debug)]
pub struct Unary {
    kind: UnaryKind,
    arg: Box<Operator>,
    cache: NodeCache,
}

impl Unary {
    /// Creates a new node.
    pub fn new(kind: UnaryKind, arg: Operator) -> Self {
        Self { kind, arg: Box::new(arg), cache: NodeCache::default() }
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> UnaryKind {
        self.kind
    }

    /// Returns the argument of this node.
    pub fn arg(&self) -> &Operator {
        &self.arg
    }

    pub(crate) fn cache(&self) -> &NodeCache {
        &self.cache
    }
}
