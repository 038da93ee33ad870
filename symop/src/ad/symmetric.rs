//! Second-order (symmetric) automatic differentiation.
//!
//! The pass visits every node once per incoming adjoint. At a node `f(a_1, ..., a_n)` with
//! adjoint `l`, it:
//!
//! 1. hands each child the adjoint `l · f_k`, where `f_k` is the `k`-th partial derivative
//! template of the node;
//! 2. receives from each child its tangents `t_k` (one per seed direction) and its second-order
//! terms `H_k`;
//! 3. returns the tangents `Σ f_k t_k` and the second-order terms
//! `Σ H_k + Σ_{p <= q} (l · f_pq) (t_p t_qᵀ + t_q t_pᵀ) / (1 + [p = q])`.
//!
//! Every kind goes through the same combination routine, fed with the first- and
//! second-derivative templates of the kind.

use crate::derivative::build::{product, sum, zeros};
use crate::error::RaggedSeedRow;
use crate::operator::{Operator, Projection};
use log::{debug, trace};
use symop_error::Error;
use super::{IndexSet, PassId};

/// The forward seeds of a symmetric pass: one row per variable index, one column per direction.
#[derive(Debug)]
pub struct SeedMatrix {
    directions: usize,
    rows: Vec<Vec<Operator>>,
}

impl SeedMatrix {
    /// Creates a seed matrix from its rows. Row `i` holds the tangents of the variable with index
    /// `i`; variables without a row have zero tangents.
    ///
    /// Fails if a row does not have exactly `directions` entries.
    pub fn new(directions: usize, rows: Vec<Vec<Operator>>) -> Result<Self, Error> {
        if let Some((row, entries)) = rows
            .iter()
            .enumerate()
            .find(|(_, entries)| entries.len() != directions)
        {
            return Err(Error::unlocated(RaggedSeedRow {
                row,
                len: entries.len(),
                directions,
            }));
        }
        Ok(Self { directions, rows })
    }

    /// The `n × n` identity: direction `i` is the unit vector of variable `i`.
    pub fn identity(n: usize) -> Self {
        let rows = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { Operator::one() } else { Operator::zero() })
                    .collect()
            })
            .collect();
        Self { directions: n, rows }
    }

    /// Returns the number of directions.
    pub fn directions(&self) -> usize {
        self.directions
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// The tangents of the variable with the given index.
    fn tangents(&self, index: usize) -> Vec<Operator> {
        match self.rows.get(index) {
            Some(row) => row.iter().map(Operator::share).collect(),
            None => zeros(self.directions),
        }
    }
}

/// A symmetric matrix of expressions, stored as its packed upper triangle in row-major order.
#[derive(Debug, PartialEq)]
pub struct Hessian {
    dim: usize,
    entries: Vec<Operator>,
}

impl Hessian {
    /// Creates a `dim × dim` matrix of zero constants.
    pub fn zeros(dim: usize) -> Self {
        Self { dim, entries: zeros(dim * (dim + 1) / 2) }
    }

    /// Returns the number of rows (and columns).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the position of entry `(i, j)` in [`Hessian::entries`], for `i <= j`.
    pub fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.dim);
        i * (2 * self.dim - i + 1) / 2 + (j - i)
    }

    /// Returns entry `(i, j)`. Either triangle may be addressed.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    pub fn get(&self, i: usize, j: usize) -> &Operator {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        assert!(j < self.dim, "entry ({i}, {j}) out of range for dimension {}", self.dim);
        &self.entries[self.offset(i, j)]
    }

    /// Returns the packed upper triangle: `(0, 0), (0, 1), ..., (0, n - 1), (1, 1), ...`.
    pub fn entries(&self) -> &[Operator] {
        &self.entries
    }

    /// Consumes the matrix, returning the packed upper triangle.
    pub fn into_entries(self) -> Vec<Operator> {
        self.entries
    }

    /// Adds `term` to entry `(i, j)`, with `i <= j`.
    fn add(&mut self, i: usize, j: usize, term: Operator) {
        let offset = self.offset(i, j);
        let previous = std::mem::replace(&mut self.entries[offset], Operator::zero());
        self.entries[offset] = sum(previous, term);
    }

    /// Adds another matrix of the same dimension, entry by entry.
    fn merge(&mut self, other: Hessian) {
        for (entry, term) in self.entries.iter_mut().zip(other.entries) {
            let previous = std::mem::replace(entry, Operator::zero());
            *entry = sum(previous, term);
        }
    }
}

/// The three index sets filled by a symmetric pass.
#[derive(Debug, Default)]
pub struct SymmetricIndexSets {
    /// Hoisted adjoints.
    pub first_order: IndexSet,

    /// Hoisted partial derivative templates and tangents.
    pub shared: IndexSet,

    /// Hoisted second-order adjoint factors and second-order terms of projections.
    pub hessian: IndexSet,
}

impl SymmetricIndexSets {
    /// Creates three empty sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of recorded projections.
    pub fn len(&self) -> usize {
        self.first_order.len() + self.shared.len() + self.hessian.len()
    }

    /// Returns true if no set holds a projection.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The result of [`Operator::symmetric_ad`].
#[derive(Debug)]
pub struct SymmetricAd {
    /// `forward[j]` is the derivative of the expression in direction `j` of the seed matrix.
    pub forward: Vec<Operator>,

    /// The second-order terms `Sᵀ (l ∇²f) S`.
    pub hessian: Hessian,
}

impl Operator {
    /// Runs a forward and a reverse pass at once, also producing second-order terms.
    ///
    /// With seed matrix `S` and adjoint `l`:
    ///
    /// - `forward[j]` is `∇f · S[:, j]`;
    /// - `l · ∂f/∂x_i` is added into `backward[i]` (variables beyond the end of `backward` are
    /// ignored);
    /// - `hessian` is `Sᵀ (l ∇²f) S`.
    ///
    /// The adjoint is consumed. Hoisted adjoints are recorded in `sets.first_order`, hoisted
    /// partial derivatives and tangents in `sets.shared`, and hoisted second-order factors in
    /// `sets.hessian`.
    ///
    /// Tangents of a projection are computed once per pass, but its adjoint is pushed through the
    /// projected expression once per parent, as in [`Operator::backward_ad`].
    pub fn symmetric_ad(
        &self,
        adjoint: Operator,
        seeds: &SeedMatrix,
        backward: &mut [Operator],
        sets: &mut SymmetricIndexSets,
    ) -> SymmetricAd {
        let mut pass = SymmetricPass {
            seeds,
            backward,
            sets,
            pass: PassId::next(),
        };
        let before = pass.sets.len();
        debug!(
            "symmetric pass {} over {} directions",
            pass.pass,
            seeds.directions(),
        );

        let terms = pass.visit(self, adjoint);

        debug!(
            "symmetric pass {} done, {} projections hoisted",
            pass.pass,
            pass.sets.len() - before,
        );
        SymmetricAd { forward: terms.forward, hessian: terms.hessian }
    }
}

/// What a node returns to its parent.
struct Terms {
    forward: Vec<Operator>,
    hessian: Hessian,
}

impl Terms {
    fn zeros(dim: usize) -> Self {
        Self { forward: zeros(dim), hessian: Hessian::zeros(dim) }
    }
}

/// A non-vanishing second partial `f_pq`, `p <= q`.
struct SecondPartial {
    p: usize,
    q: usize,
    template: Operator,
}

struct SymmetricPass<'a> {
    seeds: &'a SeedMatrix,
    backward: &'a mut [Operator],
    sets: &'a mut SymmetricIndexSets,
    pass: PassId,
}

impl SymmetricPass<'_> {
    fn visit(&mut self, op: &Operator, adjoint: Operator) -> Terms {
        match op {
            Operator::Constant(_) => Terms::zeros(self.seeds.directions()),
            Operator::Variable(variable) => {
                if !adjoint.is_zero() {
                    if let Some(slot) = self.backward.get_mut(variable.index) {
                        let previous = std::mem::replace(slot, Operator::zero());
                        *slot = sum(previous, adjoint);
                    }
                }
                Terms {
                    forward: self.seeds.tangents(variable.index),
                    hessian: Hessian::zeros(self.seeds.directions()),
                }
            },
            Operator::Unary(unary) => {
                let arg = unary.arg();
                let first = vec![unary.kind().derivative_template(arg)];
                let second = vec![SecondPartial {
                    p: 0,
                    q: 0,
                    template: unary.kind().second_derivative_template(arg),
                }];
                self.combine(&[arg], first, second, adjoint)
            },
            Operator::Binary(binary) => {
                let (kind, lhs, rhs) = (binary.kind(), binary.lhs(), binary.rhs());
                let first = vec![kind.lhs_template(lhs, rhs), kind.rhs_template(lhs, rhs)];
                let partials = kind.second_templates(lhs, rhs);
                let second = vec![
                    SecondPartial { p: 0, q: 0, template: partials.aa },
                    SecondPartial { p: 0, q: 1, template: partials.ab },
                    SecondPartial { p: 1, q: 1, template: partials.bb },
                ];
                self.combine(&[lhs, rhs], first, second, adjoint)
            },
            Operator::Projection(projection) => self.projection(projection, adjoint),
        }
    }

    /// The shared combination routine. `first[k]` is the partial derivative template with respect
    /// to `args[k]`.
    fn combine(
        &mut self,
        args: &[&Operator],
        first: Vec<Operator>,
        second: Vec<SecondPartial>,
        adjoint: Operator,
    ) -> Terms {
        let dim = self.seeds.directions();
        let adjoint = self.sets.first_order.hoist(adjoint);
        let second = second
            .into_iter()
            .filter(|partial| !partial.template.is_zero())
            .collect::<Vec<_>>();

        // partial derivatives are hoisted on first use
        let mut partials = first.into_iter().map(Partial::Template).collect::<Vec<_>>();

        let mut children = Vec::with_capacity(args.len());
        for (k, arg) in args.iter().enumerate() {
            let child_adjoint = if adjoint.is_zero() {
                Operator::zero()
            } else {
                product(adjoint.share(), self.partial(&mut partials, k))
            };
            children.push(self.visit(arg, child_adjoint));
        }

        let second_order = !adjoint.is_zero() && !second.is_empty();
        if second_order {
            for partial in &second {
                for k in [partial.p, partial.q] {
                    let tangents = std::mem::take(&mut children[k].forward);
                    children[k].forward = tangents
                        .into_iter()
                        .map(|t| self.sets.shared.hoist(t))
                        .collect();
                }
            }
        }

        let mut forward = zeros(dim);
        for k in 0..children.len() {
            for j in 0..dim {
                if children[k].forward[j].is_zero() {
                    continue;
                }
                let term = product(self.partial(&mut partials, k), children[k].forward[j].share());
                let previous = std::mem::replace(&mut forward[j], Operator::zero());
                forward[j] = sum(previous, term);
            }
        }

        let mut hessian = Hessian::zeros(dim);
        let tangents = children
            .into_iter()
            .map(|child| {
                hessian.merge(child.hessian);
                child.forward
            })
            .collect::<Vec<_>>();

        if second_order {
            for partial in second {
                let (tp, tq) = (&tangents[partial.p], &tangents[partial.q]);
                let mut weight = None;
                for i in 0..dim {
                    for j in i..dim {
                        let term = if partial.p == partial.q {
                            product(tp[i].share(), tp[j].share())
                        } else {
                            sum(
                                product(tp[i].share(), tq[j].share()),
                                product(tq[i].share(), tp[j].share()),
                            )
                        };
                        if term.is_zero() {
                            continue;
                        }

                        let w = weight.get_or_insert_with(|| {
                            self.sets
                                .hessian
                                .hoist(product(adjoint.share(), partial.template.share()))
                        });
                        hessian.add(i, j, product(w.share(), term));
                    }
                }
            }
        }

        Terms { forward, hessian }
    }

    /// Returns partial `k`, hoisting it into the shared set the first time it is needed.
    fn partial(&mut self, partials: &mut [Partial], k: usize) -> Operator {
        if let Partial::Template(template) = &partials[k] {
            let hoisted = self.sets.shared.hoist(template.share());
            partials[k] = Partial::Hoisted(hoisted);
        }
        match &partials[k] {
            Partial::Template(template) | Partial::Hoisted(template) => template.share(),
        }
    }

    /// Projections compute their tangents once per pass and hoist them. The adjoint still has to
    /// be pushed through the projected expression on every visit, since it differs per parent.
    fn projection(&mut self, projection: &Projection, adjoint: Operator) -> Terms {
        let cached = projection.symmetric_forward(self.pass);
        if adjoint.is_zero() {
            if let Some(forward) = cached {
                return Terms { forward, hessian: Hessian::zeros(self.seeds.directions()) };
            }
        }

        trace!("walking projection {} for one parent", projection.id());
        let terms = self.visit(projection.expr(), adjoint);
        let forward = match cached {
            Some(forward) => forward,
            None => {
                let forward = terms
                    .forward
                    .into_iter()
                    .map(|t| self.sets.shared.hoist(t))
                    .collect::<Vec<_>>();
                projection.store_symmetric_forward(
                    self.pass,
                    forward.iter().map(Operator::share).collect(),
                );
                forward
            },
        };

        let hessian = Hessian {
            dim: terms.hessian.dim,
            entries: terms
                .hessian
                .entries
                .into_iter()
                .map(|h| self.sets.hessian.hoist(h))
                .collect(),
        };
        Terms { forward, hessian }
    }
}

/// A partial derivative template, before and after hoisting.
enum Partial {
    Template(Operator),
    Hoisted(Operator),
}
