use approx::assert_relative_eq;
use std::collections::HashSet;
use symop::{
    ad::{IndexSet, SeedMatrix, SymmetricIndexSets},
    derivative::build::zeros,
    eval::{DomainPolicy, EvalCtxt},
    operator::{Projection, ProjectionId},
    Curvature,
    Operator,
    Simplification,
};
use test_log::test;

fn x() -> Operator {
    Operator::named_variable(0, "x")
}

fn y() -> Operator {
    Operator::named_variable(1, "y")
}

fn at(x: f64, y: f64) -> EvalCtxt {
    EvalCtxt::from_iter([(0, x), (1, y)])
}

/// A small model: a shared projection, several kinds, two variables.
fn model() -> (Projection, Operator) {
    let p = Projection::new(x() * y() + Operator::constant(0.5));
    let f = Operator::Projection(p.clone()).asin().powi(2)
        + Operator::Projection(p.clone()).exp() / y()
        - x().sqrt().log() * Operator::Projection(p.clone());
    (p, f)
}

#[test]
fn asin_derivative_values() {
    let d = x().asin().differentiate(0);
    assert_eq!(d.eval_f64(&at(0.0, 0.0)).unwrap(), 1.0);
    assert_relative_eq!(d.eval_f64(&at(0.5, 0.0)).unwrap(), 1.1547005383792517, max_relative = 1e-12);
}

#[test]
fn zero_and_one_shortcuts() {
    let d = x().log().differentiate(0);
    assert_eq!(d, x().powi(-1));

    let d = Operator::constant(3.0).log().differentiate(1);
    assert_eq!(d.simplification(), Simplification::Zero);
    assert!(d.is_zero());
}

#[test]
fn all_passes_agree() {
    let (_, f) = model();
    let point = at(0.3, 0.4);

    let symbolic = [f.differentiate(0), f.differentiate(1)];

    let forward = [
        f.forward_ad(&[Operator::one(), Operator::zero()]).derivative,
        f.forward_ad(&[Operator::zero(), Operator::one()]).derivative,
    ];

    let mut backward = zeros(2);
    f.backward_ad(Operator::one(), &mut backward, &mut IndexSet::new());

    let mut symmetric_backward = zeros(2);
    let symmetric = f.symmetric_ad(
        Operator::one(),
        &SeedMatrix::identity(2),
        &mut symmetric_backward,
        &mut SymmetricIndexSets::new(),
    );

    for i in 0..2 {
        let expected = symbolic[i].eval_f64(&point).unwrap();
        assert_relative_eq!(forward[i].eval_f64(&point).unwrap(), expected, max_relative = 1e-12);
        assert_relative_eq!(backward[i].eval_f64(&point).unwrap(), expected, max_relative = 1e-12);
        assert_relative_eq!(
            symmetric_backward[i].eval_f64(&point).unwrap(),
            expected,
            max_relative = 1e-12,
        );
        assert_relative_eq!(
            symmetric.forward[i].eval_f64(&point).unwrap(),
            expected,
            max_relative = 1e-12,
        );
    }
}

#[test]
fn hessian_matches_finite_differences_of_gradient() {
    const H: f64 = 1e-6;
    let (_, f) = model();
    let gradient = [f.differentiate(0), f.differentiate(1)];

    let mut backward = zeros(2);
    let result = f.symmetric_ad(
        Operator::one(),
        &SeedMatrix::identity(2),
        &mut backward,
        &mut SymmetricIndexSets::new(),
    );

    let (a, b) = (0.3, 0.4);
    for i in 0..2 {
        for j in i..2 {
            let (plus, minus) = if j == 0 { (at(a + H, b), at(a - H, b)) } else { (at(a, b + H), at(a, b - H)) };
            let fd = (gradient[i].eval_f64(&plus).unwrap() - gradient[i].eval_f64(&minus).unwrap())
                / (2.0 * H);
            let computed = result.hessian.get(i, j).eval_f64(&at(a, b)).unwrap();
            assert_relative_eq!(computed, fd, max_relative = 1e-5, epsilon = 1e-7);
        }
    }
}

#[test]
fn index_sets_are_complete_and_ordered() {
    let (p, f) = model();
    let result = f.forward_ad(&[Operator::one(), Operator::constant(2.0)]);

    let ids = result.index_set.iter().map(Projection::id).collect::<Vec<_>>();
    assert!(!ids.is_empty());
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let referenced = result
        .derivative
        .projections()
        .into_iter()
        .map(|projection| projection.id())
        .filter(|id| *id != p.id())
        .collect::<Vec<ProjectionId>>();
    for id in &referenced {
        assert!(ids.contains(id));
    }

    let mut backward = zeros(2);
    let mut sets = SymmetricIndexSets::new();
    let symmetric = f.symmetric_ad(Operator::one(), &SeedMatrix::identity(2), &mut backward, &mut sets);
    let recorded = [&sets.first_order, &sets.shared, &sets.hessian]
        .into_iter()
        .flat_map(|set| set.iter().map(Projection::id))
        .collect::<HashSet<_>>();
    assert_eq!(recorded.len(), sets.len());

    let outputs = symmetric.forward.iter().chain(symmetric.hessian.entries()).chain(&backward);
    for output in outputs {
        for projection in output.projections() {
            assert!(projection.id() == p.id() || recorded.contains(&projection.id()));
        }
    }
}

#[test]
fn substitution_without_the_variable_is_equivalent() {
    let (_, f) = model();
    let g = f.substitute(5, &Operator::constant(9.0));
    assert_eq!(g, f);
    for (a, b) in [(0.1, 0.2), (0.4, 0.9), (1.5, 0.1)] {
        assert_eq!(g.eval_f64(&at(a, b)).unwrap().to_bits(), f.eval_f64(&at(a, b)).unwrap().to_bits());
    }
}

#[test]
fn substitution_composes_with_differentiation() {
    let f = x().sin() * y();
    let g = f.substitute(1, &x().powi(2));
    let d = g.differentiate(0);
    let value = d.eval_f64(&at(0.7, 0.0)).unwrap();
    let expected = 0.7f64.cos() * 0.49 + 0.7f64.sin() * 1.4;
    assert_relative_eq!(value, expected, max_relative = 1e-12);
}

#[test]
fn clones_are_independent() {
    let (_, f) = model();
    let copy = f.clone();

    copy.forward_ad(&[Operator::one()]);
    copy.curvature();
    assert!(copy.cached_derivative().is_some());
    assert!(copy.cached_curvature().is_some());

    assert_eq!(f.cached_derivative(), None);
    assert_eq!(f.cached_curvature(), None);

    let original = f.projections().iter().map(Projection::id).collect::<HashSet<_>>();
    assert!(copy.projections().iter().all(|p| !original.contains(&p.id())));
}

#[test]
fn curvature_of_log() {
    let affine = x() * Operator::constant(2.0) - y() + Operator::constant(1.0);
    assert_eq!(affine.log().curvature(), Curvature::Concave);
    assert_eq!(x().sqrt().log().curvature(), Curvature::Concave);
    assert_eq!(x().powi(2).log().curvature(), Curvature::Neither);
    assert_eq!(Operator::constant(2.0).log().curvature(), Curvature::Constant);
}

#[test]
fn rejected_evaluation_reports_the_failing_call() {
    let f = x() + y().asin();
    let ctxt = at(1.0, 2.0).with_policy(DomainPolicy::Reject);
    let err = f.eval_f64(&ctxt).unwrap_err();

    let rendered = f.to_string();
    assert_eq!(rendered, "(x + asin(y))");
    assert_eq!(&rendered[err.spans[0].clone()], "asin(y)");

    let mut buf = Vec::new();
    err.build_report("f")
        .write(("f", ariadne::Source::from(&rendered)), &mut buf)
        .unwrap();
    let report = String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap();
    assert!(report.contains("`asin` is not defined at 2"), "{report}");
}
