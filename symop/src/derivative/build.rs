//! Constructors that apply the zero / one shortcuts.
//!
//! Every derivative expression in this crate is assembled through these functions, so a product
//! with a zero-tagged factor is the zero constant, a product with a one-tagged factor is the other
//! factor, and so on. The shortcuts only look at [`Simplification`] tags; no other simplification
//! is performed.

use crate::operator::{BinaryKind, Operator, Simplification};

/// `a * b`
pub fn product(a: Operator, b: Operator) -> Operator {
    match (a.simplification(), b.simplification()) {
        (Simplification::Zero, _) | (_, Simplification::Zero) => Operator::zero(),
        (Simplification::One, _) => b,
        (_, Simplification::One) => a,
        _ => Operator::binary(BinaryKind::Product, a, b),
    }
}

/// `d * f()`, where the factor is only built if `d` is neither zero nor one.
pub fn scaled(d: Operator, f: impl FnOnce() -> Operator) -> Operator {
    match d.simplification() {
        Simplification::Zero => Operator::zero(),
        Simplification::One => f(),
        Simplification::Neither => product(f(), d),
    }
}

/// `a + b`
pub fn sum(a: Operator, b: Operator) -> Operator {
    match (a.simplification(), b.simplification()) {
        (Simplification::Zero, _) => b,
        (_, Simplification::Zero) => a,
        _ => Operator::binary(BinaryKind::Addition, a, b),
    }
}

/// `a - b`
pub fn difference(a: Operator, b: Operator) -> Operator {
    match (a.simplification(), b.simplification()) {
        (_, Simplification::Zero) => a,
        (Simplification::Zero, _) => product(Operator::constant(-1.0), b),
        _ => Operator::binary(BinaryKind::Subtraction, a, b),
    }
}

/// `a / b`
pub fn quotient(a: Operator, b: Operator) -> Operator {
    match (a.simplification(), b.simplification()) {
        (Simplification::Zero, _) => Operator::zero(),
        (_, Simplification::One) => a,
        _ => Operator::binary(BinaryKind::Quotient, a, b),
    }
}

/// Returns a vector of `n` zero constants.
pub fn zeros(n: usize) -> Vec<Operator> {
    (0..n).map(|_| Operator::zero()).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn product_shortcuts() {
        let x = Operator::variable(0);
        assert_eq!(product(Operator::zero(), x.share()), Operator::zero());
        assert_eq!(product(x.share(), Operator::zero()), Operator::zero());
        assert_eq!(product(Operator::one(), x.share()), x);
        assert_eq!(product(x.share(), Operator::one()), x);
        assert_eq!(
            product(Operator::constant(2.0), x.share()),
            Operator::constant(2.0) * x.share(),
        );
    }

    #[test]
    fn shortcuts_follow_tags_not_values() {
        let x = Operator::variable(0);
        let untagged_one = Operator::tagged(1.0, Simplification::Neither);
        assert_eq!(
            product(untagged_one.share(), x.share()),
            Operator::binary(BinaryKind::Product, untagged_one, x),
        );
    }

    #[test]
    fn scaled_does_not_build_unused_factor() {
        let built = std::cell::Cell::new(false);
        let result = scaled(Operator::zero(), || {
            built.set(true);
            Operator::variable(0)
        });
        assert_eq!(result, Operator::zero());
        assert!(!built.get());
    }

    #[test]
    fn sum_and_difference() {
        let x = Operator::variable(0);
        assert_eq!(sum(Operator::zero(), x.share()), x);
        assert_eq!(difference(x.share(), Operator::zero()), x);
        assert_eq!(
            difference(Operator::zero(), x.share()),
            Operator::constant(-1.0) * x.share(),
        );
        assert_eq!(quotient(x.share(), Operator::one()), x);
        assert_eq!(quotient(Operator::zero(), x.share()), Operator::zero());
    }
}
