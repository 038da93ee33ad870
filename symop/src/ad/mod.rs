//! Automatic differentiation passes.
//!
//! Three passes are provided, each implemented once over the kind data of
//! [`UnaryKind`](crate::operator::UnaryKind) and [`BinaryKind`](crate::operator::BinaryKind):
//!
//! - [`Operator::forward_ad`] propagates one tangent seed per variable from the leaves to the
//! root, producing a directional derivative.
//! - [`Operator::backward_ad`] propagates an adjoint from the root to the leaves, summing the
//! contributions into one accumulator slot per variable.
//! - [`Operator::symmetric_ad`] does both at once and also produces the second-order terms
//! `Sᵀ (l ∇²f) S` for a seed matrix `S` and adjoint `l`.
//!
//! Every pass returns expressions, not numbers. Intermediate results that are referenced more than
//! once are hoisted into [`Projection`]s and recorded in an [`IndexSet`], so a code generator can
//! compute each of them once.
//!
//! [`Operator::forward_ad`]: crate::Operator::forward_ad
//! [`Operator::backward_ad`]: crate::Operator::backward_ad
//! [`Operator::symmetric_ad`]: crate::Operator::symmetric_ad
//! [`Projection`]: crate::operator::Projection

mod backward;
mod forward;
mod index_set;
mod symmetric;

pub use forward::ForwardAd;
pub use index_set::IndexSet;
pub use symmetric::{Hessian, SeedMatrix, SymmetricAd, SymmetricIndexSets};

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of process-unique pass ids.
static NEXT_PASS: AtomicU64 = AtomicU64::new(0);

/// Identifies one differentiation pass. Derivatives cached on a node are only reused by the pass
/// that stored them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(u64);

impl PassId {
    /// Returns a fresh id.
    pub(crate) fn next() -> Self {
        Self(NEXT_PASS.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
