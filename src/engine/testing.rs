//! Synthetic problems shared by unit tests.

use super::error::EvaluationError;
use super::types::{model, Dimension, Element, Objective, Problem};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One objective; every created element gets the next creation index as
/// its single value, and is scored by that value.
pub(crate) struct Counter {
    objectives: Vec<Objective>,
    model: Arc<[Dimension]>,
    created: AtomicUsize,
    pub(crate) evaluations: AtomicUsize,
    pub(crate) fail: AtomicBool,
    pub(crate) scores: usize,
    pub(crate) sufficient_below: Option<f64>,
}

impl Counter {
    pub(crate) fn minimizing() -> Self {
        Self::with_objective(Objective::minimize("index"))
    }

    pub(crate) fn with_objective(objective: Objective) -> Self {
        Self {
            objectives: vec![objective],
            model: model(&[1_000_000]),
            created: AtomicUsize::new(0),
            evaluations: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            scores: 1,
            sufficient_below: None,
        }
    }

    pub(crate) fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl Problem for Counter {
    fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    fn model(&self) -> Arc<[Dimension]> {
        Arc::clone(&self.model)
    }

    fn create_element<R: Rng>(&self, _rng: &mut R) -> Element {
        let index = self.created.fetch_add(1, Ordering::SeqCst);
        Element::new(vec![index as f64], self.model())
    }

    fn evaluate(&self, element: &Element) -> Result<Vec<f64>, EvaluationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EvaluationError::new("counter evaluation disabled"));
        }
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        Ok(vec![element.values()[0]; self.scores])
    }

    fn sufficient_elements(&self, population: &[Element]) -> bool {
        match self.sufficient_below {
            Some(threshold) => population
                .first()
                .and_then(|e| e.score(0))
                .is_some_and(|s| s < threshold),
            None => false,
        }
    }
}

/// Minimize squared distance to the centre of a `dims`-dimensional grid.
pub(crate) struct Sphere {
    objectives: Vec<Objective>,
    model: Arc<[Dimension]>,
}

impl Sphere {
    pub(crate) fn new(dims: usize, cardinality: usize) -> Self {
        Self {
            objectives: vec![Objective::minimize("distance")],
            model: model(&vec![cardinality; dims]),
        }
    }

    pub(crate) fn centre(&self) -> Vec<f64> {
        self.model.iter().map(|d| d.upper() / 2.0).collect()
    }
}

impl Problem for Sphere {
    fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    fn model(&self) -> Arc<[Dimension]> {
        Arc::clone(&self.model)
    }

    fn evaluate(&self, element: &Element) -> Result<Vec<f64>, EvaluationError> {
        let centre = self.centre();
        Ok(vec![element
            .values()
            .iter()
            .zip(&centre)
            .map(|(x, c)| (x - c).powi(2))
            .sum()])
    }
}

/// Two conflicting objectives on one dimension: `x²` and `(x - 4)²`.
pub(crate) struct TwoTargets {
    objectives: Vec<Objective>,
    model: Arc<[Dimension]>,
}

impl TwoTargets {
    pub(crate) fn new() -> Self {
        Self {
            objectives: vec![Objective::minimize("f1"), Objective::minimize("f2")],
            model: model(&[11]),
        }
    }
}

impl Problem for TwoTargets {
    fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    fn model(&self) -> Arc<[Dimension]> {
        Arc::clone(&self.model)
    }

    fn evaluate(&self, element: &Element) -> Result<Vec<f64>, EvaluationError> {
        let x = element.values()[0];
        Ok(vec![x * x, (x - 4.0).powi(2)])
    }
}
