//! Convexity classification of expressions.
//!
//! [`Operator::curvature`] walks the expression bottom-up and combines the curvature of the
//! children with rules supplied by each kind ([`UnaryKind::curvature`], [`BinaryKind::curvature`]).
//! The result is memoized on every composite node. When no rule applies the answer is
//! [`Curvature::Neither`]: the engine never claims a class it cannot prove.
//!
//! [`UnaryKind::curvature`]: crate::operator::UnaryKind::curvature
//! [`BinaryKind::curvature`]: crate::operator::BinaryKind::curvature

use crate::eval::EvalCtxt;
use crate::operator::Operator;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The convexity class of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Curvature {
    /// The expression does not depend on any variable.
    Constant,

    /// The expression is affine in its variables.
    Affine,

    /// The expression is convex.
    Convex,

    /// The expression is concave.
    Concave,

    /// Nothing could be proven.
    Neither,
}

impl Curvature {
    /// Returns true if an expression of this class is convex.
    pub fn is_convex(self) -> bool {
        matches!(self, Self::Constant | Self::Affine | Self::Convex)
    }

    /// Returns true if an expression of this class is concave.
    pub fn is_concave(self) -> bool {
        matches!(self, Self::Constant | Self::Affine | Self::Concave)
    }

    /// The curvature of `-f`.
    pub fn negate(self) -> Self {
        match self {
            Self::Convex => Self::Concave,
            Self::Concave => Self::Convex,
            other => other,
        }
    }

    /// The curvature of `f + g`.
    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Constant, c) | (c, Self::Constant) => c,
            (Self::Affine, c) | (c, Self::Affine) => c,
            (Self::Convex, Self::Convex) => Self::Convex,
            (Self::Concave, Self::Concave) => Self::Concave,
            _ => Self::Neither,
        }
    }

    /// The curvature of `c * f` for a constant `c`, or [`Curvature::Neither`] if the constant is
    /// not known.
    pub fn scale(self, factor: Option<f64>) -> Self {
        match factor {
            Some(c) if c > 0.0 => self,
            Some(c) if c < 0.0 => self.negate(),
            Some(c) if c == 0.0 => Self::Constant,
            _ => Self::Neither,
        }
    }

    /// The curvature of `h(f)`, where `h` is non-decreasing with curvature `intrinsic`.
    ///
    /// A constant argument stays constant, an affine argument takes the curvature of `h`, and an
    /// argument with the same curvature as `h` keeps it. Anything else is [`Curvature::Neither`].
    pub fn compose_nondecreasing(self, intrinsic: Self) -> Self {
        match self {
            Self::Constant => Self::Constant,
            Self::Affine => intrinsic,
            arg if arg == intrinsic => intrinsic,
            _ => Self::Neither,
        }
    }
}

impl std::fmt::Display for Curvature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant => write!(f, "constant"),
            Self::Affine => write!(f, "affine"),
            Self::Convex => write!(f, "convex"),
            Self::Concave => write!(f, "concave"),
            Self::Neither => write!(f, "neither convex nor concave"),
        }
    }
}

impl Operator {
    /// Returns the curvature of this expression. The result is computed once per node and cached.
    pub fn curvature(&self) -> Curvature {
        match self {
            Self::Constant(_) => Curvature::Constant,
            Self::Variable(_) => Curvature::Affine,
            Self::Unary(unary) => {
                unary.cache().curvature(|| unary.kind().curvature(unary.arg().curvature()))
            },
            Self::Binary(binary) => {
                binary.cache().curvature(|| binary.kind().curvature(binary.lhs(), binary.rhs()))
            },
            Self::Projection(projection) => {
                projection.cache().curvature(|| projection.expr().curvature())
            },
        }
    }

    /// Evaluates an expression that does not depend on any variable. Returns [`None`] if the
    /// expression contains a variable.
    pub fn constant_value(&self) -> Option<f64> {
        self.eval_f64(&EvalCtxt::new()).ok()
    }
}
