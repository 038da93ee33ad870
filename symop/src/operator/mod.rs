//! The expression DAG.
//!
//! An expression is a tree of [`Operator`] nodes. Composite nodes ([`Unary`] and [`Binary`]) own
//! their children exclusively, with one exception: a [`Projection`] is a reference-counted handle,
//! so the same projected subexpression can be referenced by many parents. This turns the tree
//! into a DAG. There is no way to build a cycle, since every node is constructed from existing
//! subtrees and nodes are never mutated after construction.
//!
//! # Copying expressions
//!
//! There are two ways to copy an expression:
//!
//! - [`Clone`] makes a **deep, sharing-free** copy. Every projection in the copy is a new
//! projection with a new id, and no cached state is carried over. Nothing done to the copy can be
//! observed through the original.
//! - [`Operator::share`] copies the structure but keeps projections shared. This is what the
//! differentiation passes use when they need the argument of a node inside a derivative
//! expression, so that hoisted temporaries stay hoisted.
//!
//! # Strict equality
//!
//! The [`PartialEq`] implementation compares expressions structurally: same kinds, same children,
//! constants with equal values and tags. Projections compare by identity. Cached state is ignored.

mod binary;
mod cache;
mod constant;
mod projection;
mod substitute;
mod unary;
mod variable;

pub use binary::{Binary, BinaryKind};
pub use constant::{Constant, Simplification};
pub use projection::{Projection, ProjectionId};
pub use unary::{Unary, UnaryKind};
pub use variable::Variable;

pub(crate) use cache::NodeCache;

use crate::curvature::Curvature;
use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies the kind of an [`Operator`] without inspecting its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatorKind {
    Constant,
    Variable,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Log,
    Sqrt,
    PowerInt,
    Addition,
    Subtraction,
    Product,
    Quotient,
    Power,
    Projection,
}

/// A node of an expression DAG.
#[derive(Debug)]
pub enum Operator {
    /// A numeric constant.
    Constant(Constant),

    /// An independent variable.
    Variable(Variable),

    /// A function of one argument, such as `asin(x)`.
    Unary(Unary),

    /// A function of two arguments, such as `x * y`.
    Binary(Binary),

    /// A shared subexpression.
    Projection(Projection),
}

impl Operator {
    /// Creates a constant from a literal value. See [`Constant::new`] for how it is tagged.
    pub fn constant(value: f64) -> Self {
        Self::Constant(Constant::new(value))
    }

    /// Creates a constant with an explicit [`Simplification`] tag.
    pub fn tagged(value: f64, tag: Simplification) -> Self {
        Self::Constant(Constant::tagged(value, tag))
    }

    /// The zero constant.
    pub fn zero() -> Self {
        Self::Constant(Constant::ZERO)
    }

    /// The one constant.
    pub fn one() -> Self {
        Self::Constant(Constant::ONE)
    }

    /// Creates the variable with the given index.
    pub fn variable(index: usize) -> Self {
        Self::Variable(Variable::new(index))
    }

    /// Creates a named variable with the given index.
    pub fn named_variable(index: usize, name: impl Into<String>) -> Self {
        Self::Variable(Variable::named(index, name))
    }

    /// Creates a unary node, taking ownership of the argument.
    pub fn unary(kind: UnaryKind, arg: Operator) -> Self {
        Self::Unary(Unary::new(kind, arg))
    }

    /// Creates a binary node, taking ownership of both arguments.
    pub fn binary(kind: BinaryKind, lhs: Operator, rhs: Operator) -> Self {
        Self::Binary(Binary::new(kind, lhs, rhs))
    }

    /// Wraps the expression in a new [`Projection`].
    pub fn projection(expr: Operator) -> Self {
        Self::Projection(Projection::new(expr))
    }

    pub fn sin(self) -> Self {
        Self::unary(UnaryKind::Sin, self)
    }

    pub fn cos(self) -> Self {
        Self::unary(UnaryKind::Cos, self)
    }

    pub fn tan(self) -> Self {
        Self::unary(UnaryKind::Tan, self)
    }

    pub fn asin(self) -> Self {
        Self::unary(UnaryKind::Asin, self)
    }

    pub fn acos(self) -> Self {
        Self::unary(UnaryKind::Acos, self)
    }

    pub fn atan(self) -> Self {
        Self::unary(UnaryKind::Atan, self)
    }

    pub fn exp(self) -> Self {
        Self::unary(UnaryKind::Exp, self)
    }

    pub fn log(self) -> Self {
        Self::unary(UnaryKind::Log, self)
    }

    pub fn sqrt(self) -> Self {
        Self::unary(UnaryKind::Sqrt, self)
    }

    /// Raises the expression to an integer power.
    pub fn powi(self, n: i32) -> Self {
        Self::unary(UnaryKind::PowerInt(n), self)
    }

    /// Raises the expression to an arbitrary power.
    pub fn pow(self, exponent: Operator) -> Self {
        Self::binary(BinaryKind::Power, self, exponent)
    }

    /// Returns the kind tag of this node.
    pub fn kind_tag(&self) -> OperatorKind {
        match self {
            Self::Constant(_) => OperatorKind::Constant,
            Self::Variable(_) => OperatorKind::Variable,
            Self::Unary(unary) => unary.kind().tag(),
            Self::Binary(binary) => binary.kind().tag(),
            Self::Projection(_) => OperatorKind::Projection,
        }
    }

    /// Returns the display name of the operation performed by this node.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Constant(_) => "constant",
            Self::Variable(_) => "variable",
            Self::Unary(unary) => unary.kind().symbol(),
            Self::Binary(binary) => binary.kind().symbol(),
            Self::Projection(_) => "projection",
        }
    }

    /// Returns the simplification tag of this node. Only constants carry a tag; every other node
    /// is [`Simplification::Neither`].
    pub fn simplification(&self) -> Simplification {
        match self {
            Self::Constant(constant) => constant.tag,
            _ => Simplification::Neither,
        }
    }

    /// Returns true if this node is the [`Simplification::Zero`]-tagged constant.
    pub fn is_zero(&self) -> bool {
        self.simplification() == Simplification::Zero
    }

    /// Returns true if this node is the [`Simplification::One`]-tagged constant.
    pub fn is_one(&self) -> bool {
        self.simplification() == Simplification::One
    }

    /// Returns true if this node is a [`Unary`] or [`Binary`] node.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Unary(_) | Self::Binary(_))
    }

    /// Copies the structure of this expression, keeping every [`Projection`] shared with the
    /// source. Cached state is not copied.
    pub fn share(&self) -> Operator {
        match self {
            Self::Constant(constant) => Self::Constant(*constant),
            Self::Variable(variable) => Self::Variable(variable.clone()),
            Self::Unary(unary) => Self::unary(unary.kind(), unary.arg().share()),
            Self::Binary(binary) => {
                Self::binary(binary.kind(), binary.lhs().share(), binary.rhs().share())
            },
            Self::Projection(projection) => Self::Projection(projection.clone()),
        }
    }

    /// Returns true if the variable with the given index occurs in this expression.
    pub fn depends_on(&self, index: usize) -> bool {
        match self {
            Self::Constant(_) => false,
            Self::Variable(variable) => variable.index == index,
            Self::Unary(unary) => unary.arg().depends_on(index),
            Self::Binary(binary) => binary.lhs().depends_on(index) || binary.rhs().depends_on(index),
            Self::Projection(projection) => projection.expr().depends_on(index),
        }
    }

    /// Returns every projection reachable from this expression, each once, in dependency order: a
    /// projection comes after every projection its expression refers to.
    pub fn projections(&self) -> Vec<Projection> {
        fn visit(op: &Operator, seen: &mut HashSet<ProjectionId>, out: &mut Vec<Projection>) {
            match op {
                Operator::Constant(_) | Operator::Variable(_) => {},
                Operator::Unary(unary) => visit(unary.arg(), seen, out),
                Operator::Binary(binary) => {
                    visit(binary.lhs(), seen, out);
                    visit(binary.rhs(), seen, out);
                },
                Operator::Projection(projection) => {
                    if seen.insert(projection.id()) {
                        visit(projection.expr(), seen, out);
                        out.push(projection.clone());
                    }
                },
            }
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        visit(self, &mut seen, &mut out);
        out
    }

    /// Returns the derivative stored by the latest forward pass that visited this node.
    pub fn cached_derivative(&self) -> Option<Operator> {
        self.cache().and_then(NodeCache::cached_derivative)
    }

    /// Returns the curvature of this node, if it has already been computed.
    pub fn cached_curvature(&self) -> Option<Curvature> {
        match self {
            Self::Constant(_) => Some(Curvature::Constant),
            Self::Variable(_) => Some(Curvature::Affine),
            _ => self.cache().and_then(NodeCache::cached_curvature),
        }
    }

    /// Drops every cached derivative in this expression, including those of projections.
    ///
    /// Cached derivatives are keyed by the pass that produced them, so stale derivatives are
    /// never used. This only releases the memory they hold.
    pub fn release_derivatives(&self) {
        match self {
            Self::Constant(_) | Self::Variable(_) => {},
            Self::Unary(unary) => {
                unary.cache().release_derivative();
                unary.arg().release_derivatives();
            },
            Self::Binary(binary) => {
                binary.cache().release_derivative();
                binary.lhs().release_derivatives();
                binary.rhs().release_derivatives();
            },
            Self::Projection(projection) => {
                projection.cache().release_derivative();
                projection.release_symmetric_forward();
                projection.expr().release_derivatives();
            },
        }
    }

    pub(crate) fn cache(&self) -> Option<&NodeCache> {
        match self {
            Self::Constant(_) | Self::Variable(_) => None,
            Self::Unary(unary) => Some(unary.cache()),
            Self::Binary(binary) => Some(binary.cache()),
            Self::Projection(projection) => Some(projection.cache()),
        }
    }
}

/// Makes a deep copy that shares nothing with the source: every projection is copied into a new
/// projection with a new id, and caches start empty.
impl Clone for Operator {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(constant) => Self::Constant(*constant),
            Self::Variable(variable) => Self::Variable(variable.clone()),
            Self::Unary(unary) => Self::unary(unary.kind(), unary.arg().clone()),
            Self::Binary(binary) => {
                Self::binary(binary.kind(), binary.lhs().clone(), binary.rhs().clone())
            },
            Self::Projection(projection) => Self::projection(projection.expr().clone()),
        }
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Constant(lhs), Self::Constant(rhs)) => lhs == rhs,
            (Self::Variable(lhs), Self::Variable(rhs)) => lhs == rhs,
            (Self::Unary(lhs), Self::Unary(rhs)) => {
                lhs.kind() == rhs.kind() && lhs.arg() == rhs.arg()
            },
            (Self::Binary(lhs), Self::Binary(rhs)) => {
                lhs.kind() == rhs.kind() && lhs.lhs() == rhs.lhs() && lhs.rhs() == rhs.rhs()
            },
            (Self::Projection(lhs), Self::Projection(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl From<f64> for Operator {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<Variable> for Operator {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<Projection> for Operator {
    fn from(projection: Projection) -> Self {
        Self::Projection(projection)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(constant) => write!(f, "{}", constant),
            Self::Variable(variable) => write!(f, "{}", variable),
            Self::Unary(unary) => match unary.kind() {
                UnaryKind::PowerInt(n) => write!(f, "{}^{}", unary.arg(), n),
                kind => write!(f, "{}({})", kind.symbol(), unary.arg()),
            },
            Self::Binary(binary) => match binary.kind() {
                BinaryKind::Power => write!(f, "{}^{}", binary.lhs(), binary.rhs()),
                BinaryKind::Product | BinaryKind::Quotient => {
                    write!(f, "({}{}{})", binary.lhs(), binary.kind().symbol(), binary.rhs())
                },
                kind => write!(f, "({} {} {})", binary.lhs(), kind.symbol(), binary.rhs()),
            },
            Self::Projection(projection) => write!(f, "{}", projection),
        }
    }
}

/// Builds an [`BinaryKind::Addition`] node. No simplification is applied.
impl Add for Operator {
    type Output = Operator;

    fn add(self, rhs: Self) -> Self::Output {
        Operator::binary(BinaryKind::Addition, self, rhs)
    }
}

/// Builds a [`BinaryKind::Subtraction`] node. No simplification is applied.
impl Sub for Operator {
    type Output = Operator;

    fn sub(self, rhs: Self) -> Self::Output {
        Operator::binary(BinaryKind::Subtraction, self, rhs)
    }
}

/// Builds a [`BinaryKind::Product`] node. No simplification is applied.
impl Mul for Operator {
    type Output = Operator;

    fn mul(self, rhs: Self) -> Self::Output {
        Operator::binary(BinaryKind::Product, self, rhs)
    }
}

/// Builds a [`BinaryKind::Quotient`] node. No simplification is applied.
impl Div for Operator {
    type Output = Operator;

    fn div(self, rhs: Self) -> Self::Output {
        Operator::binary(BinaryKind::Quotient, self, rhs)
    }
}

/// Builds the product `-1 * self`.
impl Neg for Operator {
    type Output = Operator;

    fn neg(self) -> Self::Output {
        Operator::constant(-1.0) * self
    }
}
