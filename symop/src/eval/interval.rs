use crate::error::UnboundVariable;
use crate::operator::{Constant, Operator, ProjectionId, Variable};
use std::{
    collections::HashMap,
    f64::consts::{FRAC_PI_2, PI, TAU},
};
use symop_error::Error;
use super::Evaluator;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A closed interval of the extended real line.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interval {
    /// Empty interval; no points are contained within.
    Empty,

    /// An interval with a start and end point, both included.
    Range(f64, f64),
}

impl Interval {
    /// Create a new interval from a start and end point.
    ///
    /// The interval is empty if `start > end` or if either point is NaN.
    pub fn new(start: f64, end: f64) -> Self {
        if start <= end {
            Self::Range(start, end)
        } else {
            Self::Empty
        }
    }

    /// The interval containing the single point `x`.
    pub fn point(x: f64) -> Self {
        Self::new(x, x)
    }

    /// Creates an empty interval.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// The whole extended real line.
    pub fn entire() -> Self {
        Self::Range(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Creates an interval covering the entire positive real number line, including zero.
    pub fn positive() -> Self {
        Self::Range(0.0, f64::INFINITY)
    }

    /// Returns true if the interval contains no points.
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    /// Returns true if `x` is in the interval.
    pub fn contains(self, x: f64) -> bool {
        match self {
            Interval::Empty => false,
            Interval::Range(start, end) => start <= x && x <= end,
        }
    }

    /// Maps an interval into an `Option` if it is not empty.
    pub fn map<F, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce(f64, f64) -> T,
    {
        match self {
            Interval::Empty => None,
            Interval::Range(start, end) => Some(f(*start, *end)),
        }
    }

    /// Returns the intersection of two intervals.
    pub fn intersection(self, other: Self) -> Self {
        match (self, other) {
            (Interval::Empty, _) | (_, Interval::Empty) => Interval::Empty,
            (Interval::Range(start1, end1), Interval::Range(start2, end2)) => {
                Interval::new(start1.max(start2), end1.min(end2))
            },
        }
    }

    /// Returns the smallest interval containing both intervals.
    pub fn hull(self, other: Self) -> Self {
        match (self, other) {
            (Interval::Empty, other) | (other, Interval::Empty) => other,
            (Interval::Range(start1, end1), Interval::Range(start2, end2)) => {
                Interval::Range(start1.min(start2), end1.max(end2))
            },
        }
    }

    /// Applies a non-decreasing function to both ends.
    fn increasing(self, f: impl Fn(f64) -> f64) -> Self {
        self.map(|start, end| Interval::new(f(start), f(end))).unwrap_or(Interval::Empty)
    }

    /// Applies a non-increasing function to both ends.
    fn decreasing(self, f: impl Fn(f64) -> f64) -> Self {
        self.map(|start, end| Interval::new(f(end), f(start))).unwrap_or(Interval::Empty)
    }

    /// Applies `f` to every pair of ends and returns the hull of the results. A NaN result, which
    /// only comes from `0 · ∞`, is taken to be zero.
    fn corners(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Interval::Empty, _) | (_, Interval::Empty) => Interval::Empty,
            (Interval::Range(a, b), Interval::Range(c, d)) => {
                let values = [f(a, c), f(a, d), f(b, c), f(b, d)]
                    .map(|v| if v.is_nan() { 0.0 } else { v });
                let start = values.iter().copied().fold(f64::INFINITY, f64::min);
                let end = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                Interval::Range(start, end)
            },
        }
    }

    fn add(self, other: Self) -> Self {
        match (self, other) {
            (Interval::Range(a, b), Interval::Range(c, d)) => Interval::new(a + c, b + d),
            _ => Interval::Empty,
        }
    }

    fn sub(self, other: Self) -> Self {
        match (self, other) {
            (Interval::Range(a, b), Interval::Range(c, d)) => Interval::new(a - d, b - c),
            _ => Interval::Empty,
        }
    }

    fn mul(self, other: Self) -> Self {
        self.corners(other, |a, b| a * b)
    }

    fn recip(self) -> Self {
        match self {
            Interval::Empty => Interval::Empty,
            Interval::Range(start, end) if start == 0.0 && end == 0.0 => Interval::Empty,
            Interval::Range(start, end) if start < 0.0 && end > 0.0 => Interval::entire(),
            Interval::Range(start, end) if start == 0.0 => Interval::Range(1.0 / end, f64::INFINITY),
            Interval::Range(start, end) if end == 0.0 => {
                Interval::Range(f64::NEG_INFINITY, 1.0 / start)
            },
            Interval::Range(start, end) => Interval::new(1.0 / end, 1.0 / start),
        }
    }

    fn div(self, other: Self) -> Self {
        self.mul(other.recip())
    }

    /// Returns true if `point + k·period` lies in the interval for some integer `k`.
    fn hits(self, point: f64, period: f64) -> bool {
        match self {
            Interval::Empty => false,
            Interval::Range(start, end) => {
                let k = ((start - point) / period).ceil();
                point + k * period <= end
            },
        }
    }

    fn sin(self) -> Self {
        match self {
            Interval::Empty => Interval::Empty,
            Interval::Range(start, end) if !(end - start < TAU) => Interval::Range(-1.0, 1.0),
            Interval::Range(start, end) => {
                let (a, b) = (start.sin(), end.sin());
                let lo = if self.hits(-FRAC_PI_2, TAU) { -1.0 } else { a.min(b) };
                let hi = if self.hits(FRAC_PI_2, TAU) { 1.0 } else { a.max(b) };
                Interval::Range(lo, hi)
            },
        }
    }

    fn cos(self) -> Self {
        self.add(Interval::point(FRAC_PI_2)).sin()
    }

    fn tan(self) -> Self {
        match self {
            Interval::Empty => Interval::Empty,
            Interval::Range(start, end) if !(end - start < PI) || self.hits(FRAC_PI_2, PI) => {
                Interval::entire()
            },
            _ => self.increasing(f64::tan),
        }
    }

    fn powi(self, n: i32) -> Self {
        // |n| as a float, since `-i32::MIN` does not fit an `i32`
        let m = f64::from(n.unsigned_abs());
        let power = match self {
            Interval::Empty => Interval::Empty,
            _ if n == 0 => return Interval::point(1.0),
            _ if n % 2 != 0 => self.increasing(|x| x.powf(m)),
            Interval::Range(start, end) => {
                let (a, b) = (start.powf(m), end.powf(m));
                if start <= 0.0 && end >= 0.0 {
                    Interval::Range(0.0, a.max(b))
                } else if end < 0.0 {
                    Interval::Range(b, a)
                } else {
                    Interval::Range(a, b)
                }
            },
        };
        if n < 0 {
            power.recip()
        } else {
            power
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Empty => write!(f, "∅"),
            Interval::Range(start, end) => write!(f, "[{}, {}]", start, end),
        }
    }
}

/// Computes enclosures of expressions over boxes of variable values.
///
/// The result of evaluating an expression contains the value of the expression at every point of
/// the box where it is defined. Points where a function is undefined are dropped; when no point
/// is left, the result is [`Interval::Empty`], which propagates through every later operation.
#[derive(Debug, Clone, Default)]
pub struct IntervalEvaluator {
    vars: HashMap<usize, Interval>,
    projections: HashMap<ProjectionId, Interval>,
}

impl IntervalEvaluator {
    /// Creates an evaluator with no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the range of a variable.
    pub fn add_var(&mut self, index: usize, range: Interval) {
        self.vars.insert(index, range);
        self.projections.clear();
    }

    /// Returns the range of a variable.
    pub fn get_var(&self, index: usize) -> Option<Interval> {
        self.vars.get(&index).copied()
    }
}

impl Evaluator for IntervalEvaluator {
    type Output = Interval;
    type Error = Error;

    fn constant(&mut self, constant: &Constant) -> Result<Interval, Error> {
        Ok(Interval::point(constant.value))
    }

    fn variable(&mut self, variable: &Variable) -> Result<Interval, Error> {
        self.get_var(variable.index).ok_or_else(|| {
            Error::unlocated(UnboundVariable {
                index: variable.index,
                name: variable.name.clone(),
            })
        })
    }

    fn sin(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.sin())
    }

    fn cos(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.cos())
    }

    fn tan(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.tan())
    }

    fn asin(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.intersection(Interval::Range(-1.0, 1.0)).increasing(f64::asin))
    }

    fn acos(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.intersection(Interval::Range(-1.0, 1.0)).decreasing(f64::acos))
    }

    fn atan(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.increasing(f64::atan))
    }

    fn exp(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.increasing(f64::exp))
    }

    fn log(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.intersection(Interval::positive()).increasing(f64::ln))
    }

    fn sqrt(&mut self, x: Interval) -> Result<Interval, Error> {
        Ok(x.intersection(Interval::positive()).increasing(f64::sqrt))
    }

    fn powi(&mut self, x: Interval, n: i32) -> Result<Interval, Error> {
        Ok(x.powi(n))
    }

    fn add(&mut self, a: Interval, b: Interval) -> Result<Interval, Error> {
        Ok(a.add(b))
    }

    fn sub(&mut self, a: Interval, b: Interval) -> Result<Interval, Error> {
        Ok(a.sub(b))
    }

    fn mul(&mut self, a: Interval, b: Interval) -> Result<Interval, Error> {
        Ok(a.mul(b))
    }

    fn div(&mut self, a: Interval, b: Interval) -> Result<Interval, Error> {
        Ok(a.div(b))
    }

    /// `a^b = exp(b · ln a)` over the positive part of `a`. Negative bases only have a value at
    /// integer exponents, where `|a^b| = exp(b · ln |a|)`.
    fn pow(&mut self, a: Interval, b: Interval) -> Result<Interval, Error> {
        if let Interval::Range(start, end) = b {
            if start == end && start.fract() == 0.0 && start.abs() <= f64::from(i32::MAX) {
                return Ok(a.powi(start as i32));
            }
        }

        let ln = a.intersection(Interval::positive()).increasing(f64::ln);
        let positive = b.mul(ln).increasing(f64::exp);

        let has_integer = b.map(|start, end| start.ceil() <= end).unwrap_or(false);
        if !has_integer {
            return Ok(positive);
        }
        let magnitude = a
            .intersection(Interval::Range(f64::NEG_INFINITY, 0.0))
            .decreasing(|x| (-x).ln());
        let negative = b
            .mul(magnitude)
            .increasing(f64::exp)
            .map(|_, end| Interval::Range(-end, end))
            .unwrap_or(Interval::Empty);
        Ok(positive.hull(negative))
    }

    fn projection(&mut self, id: ProjectionId, value: Interval) -> Result<Interval, Error> {
        self.projections.insert(id, value);
        Ok(value)
    }

    fn lookup_projection(&mut self, id: ProjectionId) -> Option<Interval> {
        self.projections.get(&id).copied()
    }
}

impl Operator {
    /// Computes an enclosure of the expression over the variable ranges of `evaluator`.
    ///
    /// Fails only if a variable has no range; the span of the error points at the variable in
    /// `self.to_string()`.
    pub fn eval_interval(&self, evaluator: &mut IntervalEvaluator) -> Result<Interval, Error> {
        self.evaluate_located(evaluator)
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::EvalCtxt;
    use pretty_assertions::assert_eq;
    use super::*;

    fn x() -> Operator {
        Operator::variable(0)
    }

    fn over(range: Interval) -> IntervalEvaluator {
        let mut evaluator = IntervalEvaluator::new();
        evaluator.add_var(0, range);
        evaluator
    }

    fn bounds(f: &Operator, range: Interval) -> Interval {
        f.eval_interval(&mut over(range)).unwrap()
    }

    /// Samples the range and checks that every defined value lies in the enclosure, up to
    /// rounding.
    fn assert_encloses(f: &Operator, start: f64, end: f64) {
        const SLACK: f64 = 1e-12;
        let enclosure = bounds(f, Interval::new(start, end));
        for i in 0..=200 {
            let point = start + (end - start) * f64::from(i) / 200.0;
            let value = f.eval_f64(&EvalCtxt::from_iter([(0, point)])).unwrap();
            if !value.is_finite() {
                continue;
            }
            let inside = enclosure
                .map(|lo, hi| {
                    lo - SLACK * lo.abs().max(1.0) <= value && value <= hi + SLACK * hi.abs().max(1.0)
                })
                .unwrap_or(false);
            assert!(inside, "{f} = {value} at {point} is outside {enclosure}");
        }
    }

    #[test]
    fn trigonometric_critical_points() {
        assert_eq!(bounds(&x().sin(), Interval::new(0.0, PI)), Interval::Range(0.0, 1.0));
        assert_eq!(bounds(&x().sin(), Interval::new(-10.0, 10.0)), Interval::Range(-1.0, 1.0));
        assert_eq!(bounds(&x().cos(), Interval::new(-0.5, 0.5)).map(|_, end| end), Some(1.0));
        assert_eq!(bounds(&x().tan(), Interval::new(1.0, 2.0)), Interval::entire());

        let tan = bounds(&x().tan(), Interval::new(-1.0, 1.0));
        assert_eq!(tan, Interval::Range((-1.0f64).tan(), 1.0f64.tan()));
    }

    #[test]
    fn domains_are_intersected() {
        assert_eq!(bounds(&x().sqrt(), Interval::new(-1.0, 4.0)), Interval::Range(0.0, 2.0));
        assert_eq!(
            bounds(&x().asin(), Interval::new(0.0, 3.0)),
            Interval::Range(0.0, 1.0f64.asin()),
        );
        assert_eq!(bounds(&x().log(), Interval::new(-2.0, -1.0)), Interval::Empty);
        assert_eq!(
            bounds(&(x().log() + Operator::constant(1.0)), Interval::new(-2.0, -1.0)),
            Interval::Empty,
        );
    }

    #[test]
    fn powers_and_quotients() {
        assert_eq!(bounds(&x().powi(2), Interval::new(-1.0, 2.0)), Interval::Range(0.0, 4.0));
        assert_eq!(bounds(&x().powi(2), Interval::new(-3.0, -2.0)), Interval::Range(4.0, 9.0));
        assert_eq!(bounds(&x().powi(3), Interval::new(-2.0, 1.0)), Interval::Range(-8.0, 1.0));
        assert_eq!(bounds(&x().powi(-1), Interval::new(1.0, 2.0)), Interval::Range(0.5, 1.0));
        assert_eq!(
            bounds(&(Operator::one() / x()), Interval::new(-1.0, 1.0)),
            Interval::entire(),
        );
        assert_eq!(bounds(&(Operator::one() / x()), Interval::point(0.0)), Interval::Empty);
    }

    #[test]
    fn enclosures_contain_samples() {
        assert_encloses(&(x().sin() * x().exp() - x().powi(2)), -2.0, 3.0);
        assert_encloses(&(x().cos() / (x().powi(2) + Operator::one())), -4.0, 1.0);
        assert_encloses(&x().pow(x().atan()), 0.1, 5.0);
        assert_encloses(&(x().acos() + x().log()), 0.0, 2.0);
        assert_encloses(&Operator::constant(2.0).pow(x()), -3.0, 3.0);
    }

    #[test]
    fn negative_bases_with_integer_exponents() {
        let cube = x().pow(Operator::constant(3.0));
        assert_eq!(bounds(&cube, Interval::new(-2.0, -1.0)), Interval::Range(-8.0, -1.0));
        assert!(bounds(&cube, Interval::new(-2.0, -1.0)).contains((-1.5f64).powi(3)));
        assert_encloses(&cube, -2.0, 1.0);
        assert_encloses(&x().pow(Operator::constant(-2.0)), -3.0, -0.5);

        let mut evaluator = over(Interval::new(-2.0, -1.0));
        evaluator.add_var(1, Interval::new(1.5, 2.5));
        let f = x().pow(Operator::variable(1));
        let enclosure = f.eval_interval(&mut evaluator).unwrap();
        assert!(enclosure.contains(2.25), "{enclosure}");
        assert!(enclosure.contains(4.0), "{enclosure}");

        evaluator.add_var(1, Interval::new(1.2, 1.8));
        assert_eq!(f.eval_interval(&mut evaluator).unwrap(), Interval::Empty);
    }

    #[test]
    fn extreme_integer_powers() {
        assert_eq!(bounds(&x().powi(i32::MIN), Interval::new(1.0, 2.0)), Interval::Range(0.0, 1.0));
        assert_eq!(bounds(&x().powi(i32::MIN), Interval::new(-1.0, -1.0)), Interval::point(1.0));
        assert_eq!(
            bounds(&x().powi(i32::MIN + 1), Interval::new(-1.0, -1.0)),
            Interval::point(-1.0),
        );
        assert_eq!(bounds(&x().powi(i32::MAX), Interval::new(-1.0, 1.0)), Interval::Range(-1.0, 1.0));
    }

    #[test]
    fn projections_are_memoized() {
        let p = Operator::projection(x().exp());
        let f = p.share() - p;
        assert_eq!(
            bounds(&f, Interval::new(0.0, 1.0)),
            Interval::Range(1.0 - 1f64.exp(), 1f64.exp() - 1.0),
        );
    }

    #[test]
    fn unbound_variable_is_an_error() {
        let f = x() + Operator::variable(1);
        let err = f.eval_interval(&mut over(Interval::new(0.0, 1.0))).unwrap_err();
        assert_eq!(err.spans, vec![6..8]);
    }
}
