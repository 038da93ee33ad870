use crate::ad::PassId;
use std::{
    cell::RefCell,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};
use super::{cache::NodeCache, Operator};

/// Source of process-unique projection ids.
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// The identity of a [`Projection`].
///
/// Ids are unique for the lifetime of the process and increase in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectionId(u64);

impl ProjectionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug)]
struct ProjectionNode {
    id: ProjectionId,
    expr: Operator,
    cache: NodeCache,

    /// Hoisted forward terms of the latest symmetric pass.
    symmetric: RefCell<Option<(PassId, Vec<Operator>)>>,
}

/// A shared subexpression: "this value, already computed once".
///
/// A projection is a handle to a reference-counted node. Cloning the handle shares the node;
/// the node lives as long as its longest holder. Two projections over equal expressions are
/// distinct: sharing is decided by whoever creates and hands out the handles, never by structural
/// comparison.
///
/// Note that cloning an [`Operator`] that contains a projection does **not** share it; see the
/// [`Clone`] implementation of [`Operator`].
#[derive(Debug, Clone)]
pub struct Projection(Rc<ProjectionNode>);

impl Projection {
    /// Creates a new projection over the given expression, with a fresh id.
    pub fn new(expr: Operator) -> Self {
        Self(Rc::new(ProjectionNode {
            id: ProjectionId::next(),
            expr,
            cache: NodeCache::default(),
            symmetric: RefCell::new(None),
        }))
    }

    /// Returns the id of this projection.
    pub fn id(&self) -> ProjectionId {
        self.0.id
    }

    /// Returns the projected expression.
    pub fn expr(&self) -> &Operator {
        &self.0.expr
    }

    /// Returns the number of handles currently holding this projection.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub(crate) fn cache(&self) -> &NodeCache {
        &self.0.cache
    }

    pub(crate) fn symmetric_forward(&self, pass: PassId) -> Option<Vec<Operator>> {
        self.0
            .symmetric
            .borrow()
            .as_ref()
            .filter(|(stored, _)| *stored == pass)
            .map(|(_, forward)| forward.iter().map(Operator::share).collect())
    }

    pub(crate) fn store_symmetric_forward(&self, pass: PassId, forward: Vec<Operator>) {
        *self.0.symmetric.borrow_mut() = Some((pass, forward));
    }

    pub(crate) fn release_symmetric_forward(&self) {
        self.0.symmetric.borrow_mut().take();
    }
}

/// Projections are equal if they are the same projection.
impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Projection {}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
