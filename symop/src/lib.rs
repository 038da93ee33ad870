//! Symbolic expression DAGs with symbolic, forward, reverse and second-order differentiation.
//!
//! Expressions are built from [`Operator`] nodes: constants, variables, elementary functions of
//! one or two arguments, and [`Projection`](operator::Projection)s, which share one
//! subexpression between many parents. On top of the expression type, this crate provides:
//!
//! - plain symbolic differentiation ([`Operator::differentiate`]);
//! - forward, reverse and symmetric (second-order) automatic differentiation, in the [`ad`]
//! module, which hoist shared intermediate results into projections recorded in
//! [`IndexSet`](ad::IndexSet)s;
//! - convexity classification ([`Operator::curvature`]);
//! - evaluation through the [`Evaluator`](eval::Evaluator) visitor, with `f64` and interval
//! implementations;
//! - substitution of variables ([`Operator::substitute`]).
//!
//! Derivatives are built with a zero / one shortcut: whenever a derivative is known to be exactly
//! zero or one, the result is the zero or one constant rather than an expression that evaluates
//! to it. No other simplification is performed.
//!
//! ```
//! use symop::{eval::EvalCtxt, Operator};
//!
//! let x = Operator::variable(0);
//! let f = x.share().asin() * x.share().exp();
//! let df = f.differentiate(0);
//!
//! let mut ctxt = EvalCtxt::new();
//! ctxt.add_var(0, 0.0);
//! assert_eq!(df.eval_f64(&ctxt).unwrap(), 1.0);
//!
//! // d/dx log(x) is exactly x^-1
//! assert_eq!(x.share().log().differentiate(0), x.powi(-1));
//! ```
//!
//! # Features
//!
//! - `serde`: Derives [`serde`] traits for the enumerations and value types of this crate.

pub mod ad;
pub mod curvature;
pub mod derivative;
pub mod error;
pub mod eval;
pub mod operator;

pub use curvature::Curvature;
pub use operator::{Operator, OperatorKind, Simplification};
