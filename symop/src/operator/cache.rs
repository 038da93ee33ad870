use crate::ad::PassId;
use crate::curvature::Curvature;
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use super::Operator;

/// Lazily computed state attached to a composite node.
///
/// - The curvature is computed on first request and never recomputed. Nodes are immutable after
/// construction, so it cannot go stale.
/// - The derivative is the result of the latest forward pass that visited the node. It is keyed by
/// the pass that produced it and is replaced (the old value dropped) by the next pass.
#[derive(Debug, Default)]
pub(crate) struct NodeCache {
    curvature: OnceCell<Curvature>,
    derivative: RefCell<Option<(PassId, Box<Operator>)>>,
}

impl NodeCache {
    /// Returns the cached curvature, computing it with `f` if this is the first request.
    pub fn curvature(&self, f: impl FnOnce() -> Curvature) -> Curvature {
        *self.curvature.get_or_init(f)
    }

    /// Returns the cached curvature, if it has been computed.
    pub fn cached_curvature(&self) -> Option<Curvature> {
        self.curvature.get().copied()
    }

    /// Stores the derivative produced by the given pass, dropping any previous one.
    pub fn store_derivative(&self, pass: PassId, derivative: Operator) {
        *self.derivative.borrow_mut() = Some((pass, Box::new(derivative)));
    }

    /// Returns the derivative stored by the given pass, if the latest pass was that one.
    pub fn derivative_for(&self, pass: PassId) -> Option<Operator> {
        self.derivative
            .borrow()
            .as_ref()
            .filter(|(stored, _)| *stored == pass)
            .map(|(_, derivative)| derivative.share())
    }

    /// Returns the latest stored derivative, regardless of which pass produced it.
    pub fn cached_derivative(&self) -> Option<Operator> {
        self.derivative.borrow().as_ref().map(|(_, derivative)| derivative.share())
    }

    /// Drops the stored derivative.
    pub fn release_derivative(&self) {
        self.derivative.borrow_mut().take();
    }
}
