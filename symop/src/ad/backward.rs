use crate::derivative::build::sum;
use crate::operator::Operator;
use log::{debug, trace};
use super::IndexSet;

impl Operator {
    /// Propagates `adjoint` from the root to the leaves and adds `adjoint · ∂self/∂x_i` into
    /// `accumulator[i]` for every variable `x_i`.
    ///
    /// The adjoint is consumed. Variables with an index beyond the end of the accumulator are
    /// ignored. A zero-tagged adjoint leaves the accumulator untouched.
    ///
    /// When an adjoint reaches a binary node whose operands both need it, it is hoisted into a
    /// new projection recorded in `index_set`, so both operands refer to the same value.
    ///
    /// # Cost
    ///
    /// Adjoints are not accumulated per projection: every parent of a projection pushes its own
    /// adjoint through the projected expression. A projection with `k` parents is walked `k`
    /// times, so the work grows with the number of paths from the root, which is exponential in
    /// the depth of nested sharing.
    pub fn backward_ad(
        &self,
        adjoint: Operator,
        accumulator: &mut [Operator],
        index_set: &mut IndexSet,
    ) {
        let before = index_set.len();
        debug!("backward pass into {} slots", accumulator.len());

        self.backward(adjoint, accumulator, index_set);

        debug!("backward pass done, {} projections hoisted", index_set.len() - before);
    }

    fn backward(&self, adjoint: Operator, accumulator: &mut [Operator], index_set: &mut IndexSet) {
        if adjoint.is_zero() {
            trace!("zero adjoint at {}, stopping", self.symbol());
            return;
        }

        match self {
            Self::Constant(_) => {},
            Self::Variable(variable) => {
                if let Some(slot) = accumulator.get_mut(variable.index) {
                    let previous = std::mem::replace(slot, Operator::zero());
                    *slot = sum(previous, adjoint);
                }
            },
            Self::Unary(unary) => {
                let seed = unary.kind().chain_rule(unary.arg(), adjoint);
                unary.arg().backward(seed, accumulator, index_set);
            },
            Self::Binary(binary) => {
                let (lhs, rhs, kind) = (binary.lhs(), binary.rhs(), binary.kind());
                let lhs_needed = !matches!(lhs, Self::Constant(_));
                let rhs_needed = !matches!(rhs, Self::Constant(_));

                let adjoint = if lhs_needed && rhs_needed {
                    index_set.hoist(adjoint)
                } else {
                    adjoint
                };

                if lhs_needed {
                    let seed = kind.lhs_factor(lhs, rhs, adjoint.share());
                    lhs.backward(seed, accumulator, index_set);
                }
                if rhs_needed {
                    let seed = kind.rhs_factor(lhs, rhs, adjoint);
                    rhs.backward(seed, accumulator, index_set);
                }
            },
            Self::Projection(projection) => {
                trace!("walking projection {} for one parent", projection.id());
                projection.expr().backward(adjoint, accumulator, index_set);
            },
        }
    }
}
