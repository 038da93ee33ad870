//! Functions of two arguments.
//!
//! Binary kinds follow the same pattern as unary kinds, with two partial derivatives instead of
//! one. The forward and reverse rules only ever build the partial that is multiplied by a
//! non-zero derivative or seed.

use crate::curvature::Curvature;
use crate::derivative::build::{difference, product, quotient, sum};
use super::{NodeCache, Operator, OperatorKind, Simplification};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a [`Binary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryKind {
    Addition,
    Subtraction,
    Product,
    Quotient,

    /// `lhs ^ rhs` for an arbitrary exponent.
    Power,
}

/// The symbolic second partial derivatives `f_aa`, `f_ab` and `f_bb` of a binary function.
#[derive(Debug)]
pub struct SecondPartials {
    pub aa: Operator,
    pub ab: Operator,
    pub bb: Operator,
}

impl BinaryKind {
    /// Returns the display name of the operation.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Product => "*",
            Self::Quotient => "/",
            Self::Power => "^",
        }
    }

    /// Returns the [`OperatorKind`] of nodes of this kind.
    pub fn tag(self) -> OperatorKind {
        match self {
            Self::Addition => OperatorKind::Addition,
            Self::Subtraction => OperatorKind::Subtraction,
            Self::Product => OperatorKind::Product,
            Self::Quotient => OperatorKind::Quotient,
            Self::Power => OperatorKind::Power,
        }
    }

    /// Applies the operation to two numbers.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Addition => a + b,
            Self::Subtraction => a - b,
            Self::Product => a * b,
            Self::Quotient => a / b,
            Self::Power => a.powf(b),
        }
    }

    /// The partial derivatives `(f_a, f_b)` at `(a, b)`.
    pub fn derivative(self, a: f64, b: f64) -> (f64, f64) {
        match self {
            Self::Addition => (1.0, 1.0),
            Self::Subtraction => (1.0, -1.0),
            Self::Product => (b, a),
            Self::Quotient => (1.0 / b, -a / (b * b)),
            Self::Power => (b * a.powf(b - 1.0), a.powf(b) * a.ln()),
        }
    }

    /// The second partial derivatives `(f_aa, f_ab, f_bb)` at `(a, b)`.
    pub fn second_derivative(self, a: f64, b: f64) -> (f64, f64, f64) {
        match self {
            Self::Addition | Self::Subtraction => (0.0, 0.0, 0.0),
            Self::Product => (0.0, 1.0, 0.0),
            Self::Quotient => (0.0, -1.0 / (b * b), 2.0 * a / (b * b * b)),
            Self::Power => {
                let ln = a.ln();
                (
                    b * (b - 1.0) * a.powf(b - 2.0),
                    a.powf(b - 1.0) * (1.0 + b * ln),
                    a.powf(b) * ln * ln,
                )
            },
        }
    }

    /// Returns true if `(a, b)` is inside the real domain of the operation.
    pub fn in_domain(self, a: f64, b: f64) -> bool {
        match self {
            Self::Quotient => b != 0.0,
            Self::Power => a > 0.0 || (a == 0.0 && b > 0.0) || (a < 0.0 && b.fract() == 0.0),
            _ => true,
        }
    }

    /// The symbolic partial derivative with respect to the left operand.
    pub fn lhs_template(self, a: &Operator, b: &Operator) -> Operator {
        match self {
            Self::Addition | Self::Subtraction => Operator::one(),
            Self::Product => b.share(),
            Self::Quotient => b.share().powi(-1),
            Self::Power => b.share() * a.share().pow(b.share() - Operator::one()),
        }
    }

    /// The symbolic partial derivative with respect to the right operand.
    pub fn rhs_template(self, a: &Operator, b: &Operator) -> Operator {
        match self {
            Self::Addition => Operator::one(),
            Self::Subtraction => Operator::constant(-1.0),
            Self::Product => a.share(),
            Self::Quotient => Operator::constant(-1.0) * (a.share() * b.share().powi(-2)),
            Self::Power => a.share().pow(b.share()) * a.share().log(),
        }
    }

    /// The symbolic second partial derivatives. Partials that vanish identically are the zero
    /// constant.
    pub fn second_templates(self, a: &Operator, b: &Operator) -> SecondPartials {
        match self {
            Self::Addition | Self::Subtraction => SecondPartials {
                aa: Operator::zero(),
                ab: Operator::zero(),
                bb: Operator::zero(),
            },
            Self::Product => SecondPartials {
                aa: Operator::zero(),
                ab: Operator::one(),
                bb: Operator::zero(),
            },
            Self::Quotient => SecondPartials {
                aa: Operator::zero(),
                ab: Operator::constant(-1.0) * b.share().powi(-2),
                bb: Operator::constant(2.0) * (a.share() * b.share().powi(-3)),
            },
            Self::Power => SecondPartials {
                aa: b.share()
                    * ((b.share() - Operator::one())
                        * a.share().pow(b.share() - Operator::constant(2.0))),
                ab: a.share().pow(b.share() - Operator::one())
                    * (Operator::one() + b.share() * a.share().log()),
                bb: a.share().pow(b.share()) * a.share().log().powi(2),
            },
        }
    }

    /// Multiplies `d` by the partial derivative with respect to the left operand, applying the
    /// zero / one shortcuts on `d`.
    pub fn lhs_factor(self, a: &Operator, b: &Operator, d: Operator) -> Operator {
        match d.simplification() {
            Simplification::Zero => Operator::zero(),
            Simplification::One => self.lhs_template(a, b),
            Simplification::Neither => match self {
                Self::Addition | Self::Subtraction => d,
                Self::Product => product(d, b.share()),
                Self::Quotient => quotient(d, b.share()),
                Self::Power => product(self.lhs_template(a, b), d),
            },
        }
    }

    /// Multiplies `d` by the partial derivative with respect to the right operand, applying the
    /// zero / one shortcuts on `d`.
    pub fn rhs_factor(self, a: &Operator, b: &Operator, d: Operator) -> Operator {
        match d.simplification() {
            Simplification::Zero => Operator::zero(),
            Simplification::One => self.rhs_template(a, b),
            Simplification::Neither => match self {
                Self::Addition => d,
                Self::Product => product(a.share(), d),
                kind => product(kind.rhs_template(a, b), d),
            },
        }
    }

    /// Applies the chain rule given the derivatives `da` and `db` of both operands.
    pub fn chain_rule(self, a: &Operator, b: &Operator, da: Operator, db: Operator) -> Operator {
        match self {
            Self::Subtraction => difference(da, db),
            kind => sum(kind.lhs_factor(a, b, da), kind.rhs_factor(a, b, db)),
        }
    }

    /// Computes the curvature of `a op b`.
    pub fn curvature(self, a: &Operator, b: &Operator) -> Curvature {
        let (ca, cb) = (a.curvature(), b.curvature());
        match self {
            Self::Addition => ca.add(cb),
            Self::Subtraction => ca.add(cb.negate()),
            Self::Product => match (ca, cb) {
                (Curvature::Constant, Curvature::Constant) => Curvature::Constant,
                (Curvature::Constant, other) => other.scale(a.constant_value()),
                (other, Curvature::Constant) => other.scale(b.constant_value()),
                _ => Curvature::Neither,
            },
            Self::Quotient => match (ca, cb) {
                (Curvature::Constant, Curvature::Constant) => Curvature::Constant,
                (other, Curvature::Constant) => {
                    other.scale(b.constant_value().filter(|v| *v != 0.0).map(f64::recip))
                },
                _ => Curvature::Neither,
            },
            Self::Power => match (ca, cb) {
                (Curvature::Constant, Curvature::Constant) => Curvature::Constant,
                (other, Curvature::Constant) if b.constant_value() == Some(1.0) => other,
                _ => Curvature::Neither,
            },
        }
    }
}

/// A function applied to two arguments.
#[derive(Debug)]
pub struct Binary {
    kind: BinaryKind,
    lhs: Box<Operator>,
    rhs: Box<Operator>,
    cache: NodeCache,
}

impl Binary {
    /// Creates a new node.
    pub fn new(kind: BinaryKind, lhs: Operator, rhs: Operator) -> Self {
        Self {
            kind,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            cache: NodeCache::default(),
        }
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> BinaryKind {
        self.kind
    }

    /// Returns the left operand.
    pub fn lhs(&self) -> &Operator {
        &self.lhs
    }

    /// Returns the right operand.
    pub fn rhs(&self) -> &Operator {
        &self.rhs
    }

    pub(crate) fn cache(&self) -> &NodeCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [BinaryKind; 5] = [
        BinaryKind::Addition,
        BinaryKind::Subtraction,
        BinaryKind::Product,
        BinaryKind::Quotient,
        BinaryKind::Power,
    ];

    const H: f64 = 1e-6;

    #[test]
    fn partials_match_finite_differences() {
        for kind in KINDS {
            for (a, b) in [(0.5, 1.5), (2.0, 0.3), (1.2, -0.7)] {
                let (fa, fb) = kind.derivative(a, b);
                let na = (kind.apply(a + H, b) - kind.apply(a - H, b)) / (2.0 * H);
                let nb = (kind.apply(a, b + H) - kind.apply(a, b - H)) / (2.0 * H);
                assert!((fa - na).abs() < 1e-5, "f_a of {} at ({a}, {b})", kind.symbol());
                assert!((fb - nb).abs() < 1e-5, "f_b of {} at ({a}, {b})", kind.symbol());

                let (faa, fab, fbb) = kind.second_derivative(a, b);
                let naa = (kind.derivative(a + H, b).0 - kind.derivative(a - H, b).0) / (2.0 * H);
                let nab = (kind.derivative(a, b + H).0 - kind.derivative(a, b - H).0) / (2.0 * H);
                let nbb = (kind.derivative(a, b + H).1 - kind.derivative(a, b - H).1) / (2.0 * H);
                assert!((faa - naa).abs() < 1e-4, "f_aa of {} at ({a}, {b})", kind.symbol());
                assert!((fab - nab).abs() < 1e-4, "f_ab of {} at ({a}, {b})", kind.symbol());
                assert!((fbb - nbb).abs() < 1e-4, "f_bb of {} at ({a}, {b})", kind.symbol());
            }
        }
    }

    #[test]
    fn power_domain() {
        assert!(BinaryKind::Power.in_domain(2.0, 0.5));
        assert!(BinaryKind::Power.in_domain(-2.0, 3.0));
        assert!(!BinaryKind::Power.in_domain(-2.0, 0.5));
        assert!(!BinaryKind::Power.in_domain(0.0, -1.0));
        assert!(!BinaryKind::Quotient.in_domain(1.0, 0.0));
    }

    #[test]
    fn factors_skip_zero_and_one() {
        let (a, b) = (Operator::variable(0), Operator::variable(1));
        assert_eq!(BinaryKind::Product.lhs_factor(&a, &b, Operator::zero()), Operator::zero());
        assert_eq!(BinaryKind::Product.lhs_factor(&a, &b, Operator::one()), b.share());
        assert_eq!(BinaryKind::Quotient.lhs_factor(&a, &b, Operator::one()), b.share().powi(-1));
        assert_eq!(BinaryKind::Addition.rhs_factor(&a, &b, Operator::one()), Operator::one());
    }
}
