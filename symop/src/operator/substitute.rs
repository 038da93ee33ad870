use std::collections::HashMap;
use super::{Operator, Projection, ProjectionId};

impl Operator {
    /// Returns a new expression with every occurrence of the variable with the given index
    /// replaced by `replacement`. `self` is not modified.
    ///
    /// Projections whose expression does not contain the variable are shared with `self`.
    /// Projections that do contain it are rebuilt, once per call: every reference to the same
    /// source projection refers to the same rebuilt projection in the result.
    pub fn substitute(&self, index: usize, replacement: &Operator) -> Operator {
        let mut rebuilt = HashMap::new();
        self.substitute_with(index, replacement, &mut rebuilt)
    }

    fn substitute_with(
        &self,
        index: usize,
        replacement: &Operator,
        rebuilt: &mut HashMap<ProjectionId, Projection>,
    ) -> Operator {
        match self {
            Self::Constant(constant) => Self::Constant(*constant),
            Self::Variable(variable) if variable.index == index => replacement.share(),
            Self::Variable(variable) => Self::Variable(variable.clone()),
            Self::Unary(unary) => Self::unary(
                unary.kind(),
                unary.arg().substitute_with(index, replacement, rebuilt),
            ),
            Self::Binary(binary) => Self::binary(
                binary.kind(),
                binary.lhs().substitute_with(index, replacement, rebuilt),
                binary.rhs().substitute_with(index, replacement, rebuilt),
            ),
            Self::Projection(projection) => {
                if let Some(done) = rebuilt.get(&projection.id()) {
                    return Self::Projection(done.clone());
                }
                if !projection.expr().depends_on(index) {
                    return Self::Projection(projection.clone());
                }

                let expr = projection.expr().substitute_with(index, replacement, rebuilt);
                let new = Projection::new(expr);
                rebuilt.insert(projection.id(), new.clone());
                Self::Projection(new)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::EvalCtxt;
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn absent_variable_is_a_structural_copy() {
        let p = Projection::new(Operator::variable(1).exp());
        let f = Operator::variable(0).sin() * Operator::Projection(p.clone());
        let g = f.substitute(2, &Operator::constant(4.0));
        assert_eq!(g, f);

        let Operator::Binary(product) = &g else { panic!("expected a product") };
        let Operator::Projection(q) = product.rhs() else { panic!("expected a projection") };
        assert_eq!(q.id(), p.id());
    }

    #[test]
    fn replaces_every_occurrence() {
        let x = Operator::variable(0);
        let f = x.share().powi(2) + x.share().sin();
        let g = f.substitute(0, &(Operator::variable(1) * Operator::constant(2.0)));
        assert_eq!(g.to_string(), "((x1*2)^2 + sin((x1*2)))");

        let mut ctxt = EvalCtxt::new();
        ctxt.add_var(1, 0.25);
        let expected = 0.5f64.powi(2) + 0.5f64.sin();
        assert!((g.eval_f64(&ctxt).unwrap() - expected).abs() < 1e-15);
        assert!(!g.depends_on(0));
    }

    #[test]
    fn dependent_projection_is_rebuilt_once() {
        let p = Projection::new(Operator::variable(0).exp());
        let f = Operator::Projection(p.clone()) + Operator::Projection(p.clone()).log();
        let g = f.substitute(0, &Operator::constant(3.0));

        let Operator::Binary(sum) = &g else { panic!("expected a sum") };
        let Operator::Projection(lhs) = sum.lhs() else { panic!("expected a projection") };
        let Operator::Unary(log) = sum.rhs() else { panic!("expected a log") };
        let Operator::Projection(rhs) = log.arg() else { panic!("expected a projection") };

        assert_ne!(lhs.id(), p.id());
        assert_eq!(lhs.id(), rhs.id());
        assert_eq!(lhs.expr(), &Operator::constant(3.0).exp());
        assert_eq!(p.expr(), &Operator::variable(0).exp());
    }
}
