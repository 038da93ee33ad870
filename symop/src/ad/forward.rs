use crate::operator::Operator;
use log::debug;
use super::{IndexSet, PassId};

/// The result of [`Operator::forward_ad`].
#[derive(Debug)]
pub struct ForwardAd {
    /// The directional derivative.
    pub derivative: Operator,

    /// The projections created while computing the derivative, in creation order.
    pub index_set: IndexSet,
}

impl Operator {
    /// Propagates tangent seeds from the leaves to the root and returns the directional
    /// derivative `Σ seeds[i] · ∂self/∂x_i`.
    ///
    /// `seeds[i]` is the tangent of the variable with index `i`; variables with an index beyond
    /// the end of `seeds` have a zero tangent. The seeds are referenced by the result, so
    /// projections inside them stay shared.
    ///
    /// Each projection in `self` is differentiated once. If its derivative is composite, it is
    /// hoisted into a new projection and recorded in the returned index set, and every parent of
    /// the projection refers to that one new projection.
    ///
    /// Every composite node of `self` keeps the derivative computed for it by this call, which can
    /// be read back with [`Operator::cached_derivative`] until the next forward pass replaces it.
    pub fn forward_ad(&self, seeds: &[Operator]) -> ForwardAd {
        let mut index_set = IndexSet::new();
        let derivative = self.forward_ad_into(seeds, &mut index_set);
        ForwardAd { derivative, index_set }
    }

    /// Same as [`Operator::forward_ad`], but records the created projections in an existing index
    /// set. This allows several passes to share one set.
    pub fn forward_ad_into(&self, seeds: &[Operator], index_set: &mut IndexSet) -> Operator {
        let pass = PassId::next();
        let before = index_set.len();
        debug!("forward pass {} over {} seeds", pass, seeds.len());

        let derivative = self.forward(seeds, pass, index_set);

        debug!(
            "forward pass {} done, {} projections hoisted",
            pass,
            index_set.len() - before,
        );
        derivative
    }

    fn forward(&self, seeds: &[Operator], pass: PassId, index_set: &mut IndexSet) -> Operator {
        match self {
            Self::Constant(_) => Operator::zero(),
            Self::Variable(variable) => seeds
                .get(variable.index)
                .map_or_else(Operator::zero, Operator::share),
            Self::Unary(unary) => {
                let d_arg = unary.arg().forward(seeds, pass, index_set);
                let derivative = unary.kind().chain_rule(unary.arg(), d_arg);
                unary.cache().store_derivative(pass, derivative.share());
                derivative
            },
            Self::Binary(binary) => {
                let da = binary.lhs().forward(seeds, pass, index_set);
                let db = binary.rhs().forward(seeds, pass, index_set);
                let derivative = binary.kind().chain_rule(binary.lhs(), binary.rhs(), da, db);
                binary.cache().store_derivative(pass, derivative.share());
                derivative
            },
            Self::Projection(projection) => {
                if let Some(derivative) = projection.cache().derivative_for(pass) {
                    return derivative;
                }
                let inner = projection.expr().forward(seeds, pass, index_set);
                let derivative = index_set.hoist(inner);
                projection.cache().store_derivative(pass, derivative.share());
                derivative
            },
        }
    }
}
