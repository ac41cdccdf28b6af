//! Core type definitions for the engine.
//!
//! [`Element`] is the candidate solution handled by every stage of the
//! iteration pipeline; [`Problem`] is the contract between the generic
//! engine and a domain-specific problem implementation.

use super::error::EvaluationError;
use super::multi_objective::dominance;
use rand::Rng;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a constructed [`Element`].
///
/// Every call to [`Element::new`] yields a fresh id. Scoring an element
/// (see [`Element::with_evaluation`]) keeps its id, so the id names "the
/// same candidate" across the unevaluated and evaluated copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        ElementId(NEXT_ELEMENT_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Domain descriptor of one decision dimension.
///
/// A dimension with cardinality `k` admits values in `[0, k - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    /// Number of distinct values the dimension spans.
    pub cardinality: usize,
}

impl Dimension {
    /// Creates a dimension with the given cardinality.
    pub fn new(cardinality: usize) -> Self {
        Self { cardinality }
    }

    /// Largest admissible value, `cardinality - 1` (0 for an empty dimension).
    pub fn upper(&self) -> f64 {
        self.cardinality.saturating_sub(1) as f64
    }

    /// Declared range of the dimension, used to scale random velocities.
    pub fn range(&self) -> f64 {
        self.cardinality as f64
    }

    /// Clamps a value into `[0, upper]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(0.0, self.upper())
    }
}

/// Builds a shared model from a list of cardinalities.
///
/// ```
/// use u_swarm::engine::model;
///
/// let m = model(&[10, 10, 4]);
/// assert_eq!(m.len(), 3);
/// assert_eq!(m[2].cardinality, 4);
/// ```
pub fn model(cardinalities: &[usize]) -> Arc<[Dimension]> {
    cardinalities.iter().map(|&c| Dimension::new(c)).collect()
}

/// Optimization direction of one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Lower scores are better.
    #[default]
    Minimize,
    /// Higher scores are better.
    Maximize,
}

impl Direction {
    /// Compares two scores: `Greater` when `a` is better than `b`.
    ///
    /// NaN compares as `Equal` to anything.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        let natural = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Direction::Minimize => natural.reverse(),
            Direction::Maximize => natural,
        }
    }
}

/// One scalar optimization dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Name used for statistics series.
    pub name: String,
    /// Whether lower or higher scores are better.
    pub direction: Direction,
}

impl Objective {
    /// An objective to minimize.
    pub fn minimize(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Minimize,
        }
    }

    /// An objective to maximize.
    pub fn maximize(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Maximize,
        }
    }
}

/// Pareto annotation of an element within one ranked snapshot.
///
/// Relations are stored by [`ElementId`] and are only meaningful for the
/// snapshot they were computed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pareto {
    /// Elements that dominate this one.
    pub dominators: Vec<ElementId>,
    /// Elements this one dominates.
    pub dominated: Vec<ElementId>,
}

/// A candidate solution.
///
/// Carries its decision values, the shared domain model, and, once scored,
/// one evaluation per objective. Ranking annotations (Pareto relations,
/// crowding distance, strength) are attached by the multi-objective sorts.
///
/// Elements are never moved in place: a different position is a new
/// element built with [`Element::new`].
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    values: Vec<f64>,
    model: Arc<[Dimension]>,
    evaluation: Option<Vec<f64>>,
    pub(crate) pareto: Option<Pareto>,
    pub(crate) crowding_distance: Option<f64>,
    pub(crate) pareto_strength: Option<f64>,
}

impl Element {
    /// Creates an unevaluated element with a fresh id.
    pub fn new(values: Vec<f64>, model: Arc<[Dimension]>) -> Self {
        debug_assert_eq!(
            values.len(),
            model.len(),
            "decision vector must match model dimensionality"
        );
        Self {
            id: ElementId::next(),
            values,
            model,
            evaluation: None,
            pareto: None,
            crowding_distance: None,
            pareto_strength: None,
        }
    }

    /// Returns a scored copy of this element, keeping its id.
    ///
    /// Ranking annotations are dropped: they belong to a snapshot that no
    /// longer holds once scores change.
    pub fn with_evaluation(mut self, evaluation: Vec<f64>) -> Self {
        self.evaluation = Some(evaluation);
        self.pareto = None;
        self.crowding_distance = None;
        self.pareto_strength = None;
        self
    }

    /// Identity of this element.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Ordered decision values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Per-dimension domain descriptors.
    pub fn model(&self) -> &[Dimension] {
        &self.model
    }

    /// Shared handle to the model, for building sibling elements.
    pub fn model_handle(&self) -> Arc<[Dimension]> {
        Arc::clone(&self.model)
    }

    /// Evaluation vector, one score per objective, if scored.
    pub fn evaluation(&self) -> Option<&[f64]> {
        self.evaluation.as_deref()
    }

    /// Whether the element has been evaluated.
    pub fn is_evaluated(&self) -> bool {
        self.evaluation.is_some()
    }

    /// Score of objective `index`, if scored.
    pub fn score(&self, index: usize) -> Option<f64> {
        self.evaluation.as_ref().and_then(|e| e.get(index).copied())
    }

    /// Pareto annotation from the last multi-objective analysis.
    pub fn pareto(&self) -> Option<&Pareto> {
        self.pareto.as_ref()
    }

    /// Number of dominators in the last analysed snapshot (0 if unannotated).
    pub fn dominator_count(&self) -> usize {
        self.pareto.as_ref().map_or(0, |p| p.dominators.len())
    }

    /// Number of dominated elements in the last analysed snapshot.
    pub fn dominated_count(&self) -> usize {
        self.pareto.as_ref().map_or(0, |p| p.dominated.len())
    }

    /// Crowding distance from the last non-dominated sort.
    pub fn crowding_distance(&self) -> Option<f64> {
        self.crowding_distance
    }

    /// Pareto strength from the last strength sort.
    pub fn pareto_strength(&self) -> Option<f64> {
        self.pareto_strength
    }

    /// Whether this element compares better than `other` under `problem`.
    pub fn is_better_than<P: Problem + ?Sized>(&self, other: &Element, problem: &P) -> bool {
        problem.compare(self, other) == Ordering::Greater
    }
}

/// Defines an optimization problem.
///
/// The engine consumes this trait as a capability: it never inspects
/// domain semantics beyond what these methods expose.
///
/// # Thread Safety
///
/// `Problem` must be `Send + Sync` because evaluations are dispatched
/// concurrently using rayon.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_swarm::engine::{model, Dimension, Element, EvaluationError, Objective, Problem};
///
/// struct Sphere {
///     objectives: Vec<Objective>,
///     model: Arc<[Dimension]>,
/// }
///
/// impl Problem for Sphere {
///     fn objectives(&self) -> &[Objective] {
///         &self.objectives
///     }
///
///     fn model(&self) -> Arc<[Dimension]> {
///         Arc::clone(&self.model)
///     }
///
///     fn evaluate(&self, element: &Element) -> Result<Vec<f64>, EvaluationError> {
///         Ok(vec![element.values().iter().map(|x| (x - 5.0).powi(2)).sum()])
///     }
/// }
///
/// let sphere = Sphere {
///     objectives: vec![Objective::minimize("distance")],
///     model: model(&[11, 11]),
/// };
/// let a = Element::new(vec![5.0, 5.0], sphere.model()).with_evaluation(vec![0.0]);
/// let b = Element::new(vec![0.0, 0.0], sphere.model()).with_evaluation(vec![50.0]);
/// assert!(a.is_better_than(&b, &sphere));
/// ```
pub trait Problem: Send + Sync {
    /// Ordered objective specifications. More than one enables Pareto ranking.
    fn objectives(&self) -> &[Objective];

    /// Domain model shared by every element of this problem.
    fn model(&self) -> Arc<[Dimension]>;

    /// Scores an element, returning one value per objective.
    ///
    /// This is typically the most expensive operation. The engine may call
    /// it concurrently across a batch.
    fn evaluate(&self, element: &Element) -> Result<Vec<f64>, EvaluationError>;

    /// Creates a random element.
    ///
    /// The default draws each value uniformly in `[0, cardinality - 1]`.
    fn create_element<R: Rng>(&self, rng: &mut R) -> Element {
        let model = self.model();
        let values = model
            .iter()
            .map(|d| rng.random_range(0.0..=d.upper()))
            .collect();
        Element::new(values, model)
    }

    /// Signed domination: `Greater` when `a` is better than (dominates) `b`,
    /// `Less` when `b` is better, `Equal` when neither.
    ///
    /// The default compares scores by objective direction: plain score
    /// comparison for one objective, Pareto dominance for several.
    /// Unevaluated elements lose against evaluated ones.
    fn compare(&self, a: &Element, b: &Element) -> Ordering {
        match (a.evaluation(), b.evaluation()) {
            (Some(ea), Some(eb)) => dominance(ea, eb, self.objectives()),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }

    /// Alternate termination test: `true` when the population is good enough.
    ///
    /// The default never stops early.
    fn sufficient_elements(&self, _population: &[Element]) -> bool {
        false
    }
}
