use crate::operator::{Operator, Projection, ProjectionId};
use log::trace;

/// The projections created by one differentiation call, in creation order.
///
/// An index set is bookkeeping only. It does not take part in computing derivatives and never
/// deduplicates by structure: two projections over equal expressions are two entries. A code
/// generator declares each entry as a temporary before its first use, which is always safe in
/// creation order, since a projection can only refer to projections created before it.
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    projections: Vec<Projection>,
}

impl IndexSet {
    /// Creates an empty index set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a projection.
    pub fn push(&mut self, projection: Projection) {
        self.projections.push(projection);
    }

    /// Wraps a composite expression in a new projection, records it, and returns a reference to
    /// it. Leaves and existing projections are returned unchanged, since there is nothing to
    /// share.
    pub fn hoist(&mut self, expr: Operator) -> Operator {
        if !expr.is_composite() {
            return expr;
        }
        let projection = Projection::new(expr);
        trace!("hoisted {} = {}", projection.id(), projection.expr());
        self.push(projection.clone());
        Operator::Projection(projection)
    }

    /// Returns true if the projection with the given id was recorded in this set.
    pub fn contains(&self, id: ProjectionId) -> bool {
        self.projections.iter().any(|projection| projection.id() == id)
    }

    /// Returns the number of recorded projections.
    pub fn len(&self) -> usize {
        self.projections.len()
    }

    /// Returns true if no projection was recorded.
    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    /// Returns an iterator over the recorded projections, in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Projection> {
        self.projections.iter()
    }

    /// Returns the recorded projections, in creation order.
    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    /// Consumes the set, returning the recorded projections.
    pub fn into_vec(self) -> Vec<Projection> {
        self.projections
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a Projection;
    type IntoIter = std::slice::Iter<'a, Projection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_are_not_hoisted() {
        let mut set = IndexSet::new();
        assert_eq!(set.hoist(Operator::zero()), Operator::zero());
        assert_eq!(set.hoist(Operator::variable(3)), Operator::variable(3));

        let p = Operator::projection(Operator::variable(0).sin());
        assert_eq!(set.hoist(p.share()), p);
        assert!(set.is_empty());
    }

    #[test]
    fn composites_are_recorded_in_order() {
        let mut set = IndexSet::new();
        let a = set.hoist(Operator::variable(0).sin());
        let b = set.hoist(a.share() * Operator::variable(1));

        let (Operator::Projection(a), Operator::Projection(b)) = (&a, &b) else {
            panic!("expected projections");
        };
        let ids = set.iter().map(Projection::id).collect::<Vec<_>>();
        assert_eq!(ids, vec![a.id(), b.id()]);
        assert!(a.id() < b.id());
        assert!(set.contains(b.id()));
    }
}
