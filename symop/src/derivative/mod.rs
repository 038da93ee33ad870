//! Plain symbolic differentiation.
//!
//! [`Operator::differentiate`] returns a new expression for the partial derivative with respect
//! to one variable. The chain rule of every node is applied through the zero / one shortcuts of
//! [`build`], so differentiating an expression that does not depend on the variable yields the
//! zero constant, and differentiating a function of a variable that appears once, linearly, yields
//! the derivative template alone, never a product with a literal one.

pub mod build;

use crate::operator::Operator;

impl Operator {
    /// Returns the partial derivative of this expression with respect to the variable with the
    /// given index.
    ///
    /// Projections are differentiated through: the derivative of a projection is the derivative
    /// of its expression. Use [`Operator::forward_ad`] to hoist shared derivatives instead.
    pub fn differentiate(&self, index: usize) -> Operator {
        match self {
            Self::Constant(_) => Operator::zero(),
            Self::Variable(variable) => {
                if variable.index == index {
                    Operator::one()
                } else {
                    Operator::zero()
                }
            },
            Self::Unary(unary) => {
                let d_arg = unary.arg().differentiate(index);
                unary.kind().chain_rule(unary.arg(), d_arg)
            },
            Self::Binary(binary) => {
                let da = binary.lhs().differentiate(index);
                let db = binary.rhs().differentiate(index);
                binary.kind().chain_rule(binary.lhs(), binary.rhs(), da, db)
            },
            Self::Projection(projection) => projection.expr().differentiate(index),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use crate::eval::EvalCtxt;
    use crate::operator::{Operator, OperatorKind, Simplification};
    use pretty_assertions::assert_eq;

    /// Boilerplate helper function for evaluating an expression at `x0 = x`.
    fn eval_x(e: &Operator, x: f64) -> f64 {
        let mut ctxt = EvalCtxt::new();
        ctxt.add_var(0, x);
        e.eval_f64(&ctxt).unwrap()
    }

    /// Performs central finite difference to approximate the derivative of the expression.
    fn finite_difference(e: &Operator, x: f64) -> f64 {
        const DX: f64 = 1e-6;
        (eval_x(e, x + DX) - eval_x(e, x - DX)) / (2.0 * DX)
    }

    fn test_for_function(name: &str, f: Operator, points: impl IntoIterator<Item = f64>) {
        const TOL: f64 = 1e-5;

        let symbolic = f.differentiate(0);
        for point in points {
            let symbolically_computed = eval_x(&symbolic, point);
            let numerically_computed = finite_difference(&f, point);

            assert!(
                (symbolically_computed - numerically_computed).abs() < TOL,
                "For \"{name}\" at x={point}, symbolically computed derivative was {symbolically_computed} but numerically computed derivative was {numerically_computed}, which was out of tolerance {TOL}",
            );
        }
    }

    fn x() -> Operator {
        Operator::variable(0)
    }

    #[test]
    fn unary_kinds() {
        let points = [0.1, 0.35, 0.6, 0.85];
        test_for_function("sin(x)", x().sin(), points);
        test_for_function("cos(x)", x().cos(), points);
        test_for_function("tan(x)", x().tan(), points);
        test_for_function("asin(x)", x().asin(), points);
        test_for_function("acos(x)", x().acos(), points);
        test_for_function("atan(x)", x().atan(), points);
        test_for_function("exp(x)", x().exp(), points);
        test_for_function("log(x)", x().log(), points);
        test_for_function("sqrt(x)", x().sqrt(), points);
        test_for_function("x^3", x().powi(3), points);
        test_for_function("x^-2", x().powi(-2), points);
    }

    #[test]
    fn binary_kinds() {
        let points = [0.2, 0.5, 1.3, 2.0];
        test_for_function("x + sin(x)", x() + x().sin(), points);
        test_for_function("exp(x) - x^2", x().exp() - x().powi(2), points);
        test_for_function("x * log(x)", x() * x().log(), points);
        test_for_function("sin(x) / x", x().sin() / x(), points);
        test_for_function("x^x", x().pow(x()), points);
        test_for_function("2.5^x", Operator::constant(2.5).pow(x()), points);
        test_for_function("x^1.5", x().pow(Operator::constant(1.5)), points);
    }

    #[test]
    fn nested_chain_rule() {
        let f = (x().powi(2) * Operator::constant(0.5)).asin().log() + x().sqrt().exp().atan();
        test_for_function("log(asin(0.5 x^2)) + atan(exp(sqrt(x)))", f, [0.3, 0.7, 1.1]);
    }

    #[test]
    fn asin_at_points() {
        let d = x().asin().differentiate(0);
        assert_eq!(eval_x(&d, 0.0), 1.0);
        assert!((eval_x(&d, 0.5) - 1.1547005383792517).abs() < 1e-12);
    }

    #[test]
    fn log_of_variable_is_single_power() {
        let d = x().log().differentiate(0);
        assert_eq!(d, x().powi(-1));
        assert_eq!(d.kind_tag(), OperatorKind::PowerInt);
    }

    #[test]
    fn log_of_constant_is_zero() {
        let d = Operator::constant(3.0).log().differentiate(0);
        assert_eq!(d, Operator::zero());
        assert_eq!(d.simplification(), Simplification::Zero);
    }

    #[test]
    fn other_variable_is_zero() {
        let f = (Operator::variable(1).sin() * Operator::variable(2)).log();
        assert_eq!(f.differentiate(0), Operator::zero());
    }

    #[test]
    fn log_of_composite_is_quotient() {
        let inner = x().sin();
        let d = inner.share().log().differentiate(0);
        assert_eq!(d, x().cos() / inner);
    }

    #[test]
    fn asin_of_variable_is_template() {
        let d = x().asin().differentiate(0);
        let expected = (Operator::one() - x().powi(2)).pow(Operator::constant(-0.5));
        assert_eq!(d, expected);
    }

    #[test]
    fn linear_terms_have_no_unit_products() {
        let f = x() * Operator::variable(1) + x();
        let d = f.differentiate(0);
        assert_eq!(d, Operator::variable(1) + Operator::one());
    }

    #[test]
    fn extreme_integer_powers() {
        let d = x().powi(i32::MIN).differentiate(0);
        assert_eq!(eval_x(&d, 1.0), f64::from(i32::MIN));
        assert_eq!(eval_x(&d, -1.0), -f64::from(i32::MIN));

        let d = x().powi(i32::MIN + 1).differentiate(0);
        assert_eq!(d, Operator::constant(f64::from(i32::MIN + 1)) * x().powi(i32::MIN));
        assert_eq!(eval_x(&d, 1.0), f64::from(i32::MIN + 1));
    }

    #[test]
    fn projection_is_differentiated_through() {
        let p = Operator::projection(x().sin());
        assert_eq!(p.differentiate(0), x().cos());
    }
}
