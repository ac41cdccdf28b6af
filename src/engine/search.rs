//! Population state and the base pipeline operations.
//!
//! [`Search`] owns the working population, the step counter, the random
//! source, the optional statistics sink and the signal listeners. Every
//! phase computes a new collection and publishes it in one assignment;
//! elements already published are never modified afterwards.

use super::config::{EngineConfig, Ranking};
use super::error::EngineError;
use super::multi_objective::{non_dominated_sort, pareto_front, strength_pareto_sort};
use super::signals::{Event, Signal, Signals};
use super::statistics::StatisticsSink;
use super::types::{Element, Problem};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Statistic receiving the wall-clock seconds of each evaluation batch.
pub const EVALUATION_TIME: &str = "evaluation time";
/// Statistic receiving per-element dominator counts (multi-objective).
pub const DOMINATORS: &str = "dominators";
/// Statistic receiving per-element dominated counts (multi-objective).
pub const DOMINATED: &str = "dominated";

/// Working state of an optimization run.
///
/// Most callers drive a `Search` through [`Engine`](super::Engine); the
/// operations here are the building blocks a [`Strategy`](super::Strategy)
/// composes into an update step.
pub struct Search<P: Problem> {
    problem: P,
    config: EngineConfig,
    pub(super) population: Vec<Element>,
    pub(super) step: i64,
    rng: StdRng,
    statistics: Option<Box<dyn StatisticsSink>>,
    signals: Signals,
}

impl<P: Problem> Search<P> {
    /// Creates an unstarted search. Malformed configuration values are
    /// coerced to their defaults.
    pub fn new(problem: P, config: EngineConfig) -> Self {
        let config = config.normalized();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        Self {
            problem,
            config,
            population: Vec::new(),
            step: -1,
            rng,
            statistics: None,
            signals: Signals::default(),
        }
    }

    /// Replaces the random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Attaches a statistics sink.
    pub fn with_statistics(mut self, sink: impl StatisticsSink + 'static) -> Self {
        self.statistics = Some(Box::new(sink));
        self
    }

    /// Registers a lifecycle listener.
    pub fn on<F>(&mut self, listener: F)
    where
        F: FnMut(Signal, &Event<'_>) + Send + 'static,
    {
        self.signals.on(listener);
    }

    /// The problem being optimized.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Effective (normalized) configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current population; index 0 is the best element once ranked.
    pub fn population(&self) -> &[Element] {
        &self.population
    }

    /// Step counter: `-1` before the first advance completes.
    pub fn step(&self) -> i64 {
        self.step
    }

    /// Random source shared by all phases.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Attached statistics sink, if any.
    pub fn statistics(&self) -> Option<&dyn StatisticsSink> {
        self.statistics.as_deref()
    }

    /// The best-ranked element.
    pub fn best(&self) -> Result<&Element, EngineError> {
        self.population.first().ok_or(EngineError::EmptyPopulation)
    }

    /// Elements with no dominators in the current snapshot.
    ///
    /// Empty unless a multi-objective sort has annotated the population.
    pub fn pareto_front(&self) -> Vec<&Element> {
        pareto_front(&self.population)
    }

    /// Whether the run is over: the step limit is reached or the problem
    /// reports the population sufficient. Never true before the first
    /// advance.
    pub fn is_finished(&self) -> bool {
        self.step >= 0
            && (self.step + 1 >= self.config.max_steps as i64
                || self.problem.sufficient_elements(&self.population))
    }

    /// Replaces the population with `size` fresh, unevaluated elements.
    pub fn initiate(&mut self, size: usize) {
        self.population = (0..size)
            .map(|_| self.problem.create_element(&mut self.rng))
            .collect();
        self.emit(Signal::Initiated);
    }

    /// Generates the default expansion: `floor(expansion_rate × size)`
    /// fresh elements. The population is not touched.
    pub fn expansion(&mut self) -> Vec<Element> {
        (0..self.config.expansion_size())
            .map(|_| self.problem.create_element(&mut self.rng))
            .collect()
    }

    /// Appends `elements`, or the default [`expansion`](Self::expansion)
    /// when `None`. An empty expansion is logged and leaves the population
    /// as it was.
    pub fn expand(&mut self, elements: Option<Vec<Element>>) {
        let additions = match elements {
            Some(elements) => elements,
            None => self.expansion(),
        };
        if additions.is_empty() {
            tracing::warn!(
                step = self.step,
                population_size = self.config.population_size,
                expansion_rate = self.config.expansion_rate,
                "expansion produced no elements"
            );
        } else {
            self.population.extend(additions);
        }
        self.emit(Signal::Expanded);
    }

    /// Evaluates the whole population and ranks it.
    pub fn evaluate(&mut self) -> Result<(), EngineError> {
        self.evaluate_where(|_| true)
    }

    /// Evaluates only the unevaluated elements, keeps the others, and
    /// ranks the result.
    pub fn evaluate_pending(&mut self) -> Result<(), EngineError> {
        self.evaluate_where(|e| !e.is_evaluated())
    }

    fn evaluate_where(&mut self, select: impl Fn(&Element) -> bool) -> Result<(), EngineError> {
        let (targets, mut population): (Vec<Element>, Vec<Element>) =
            self.population.iter().cloned().partition(|e| select(e));

        let evaluated = self.evaluate_batch(targets)?;
        population.extend(evaluated.iter().cloned());
        self.population = self.rank(population);

        self.signals.emit(
            Signal::Evaluated,
            &Event {
                step: self.step,
                population: &self.population,
                evaluated: Some(&evaluated),
            },
        );
        Ok(())
    }

    /// Scores a batch of elements without touching the population.
    ///
    /// The batch is dispatched concurrently when `parallel` is set and the
    /// call returns once every evaluation finished. Elapsed time goes to
    /// [`EVALUATION_TIME`].
    pub fn evaluate_batch(&mut self, elements: Vec<Element>) -> Result<Vec<Element>, EngineError> {
        if let Some(sink) = self.statistics.as_mut() {
            sink.start_time(EVALUATION_TIME);
        }

        let evaluated = evaluate_elements(&self.problem, elements, self.config.parallel)?;

        if let Some(sink) = self.statistics.as_mut() {
            sink.add_time(EVALUATION_TIME, self.step);
        }
        Ok(evaluated)
    }

    /// Ranks the population in place (best first).
    pub fn sort(&mut self) {
        let population = std::mem::take(&mut self.population);
        self.population = self.rank(population);
    }

    /// Ranks an arbitrary collection the way [`sort`](Self::sort) ranks
    /// the population.
    ///
    /// One objective: stable sort by the problem comparator, best first.
    /// Several: the configured [`Ranking`] strategy.
    pub fn rank(&self, mut elements: Vec<Element>) -> Vec<Element> {
        if self.problem.objectives().len() > 1 {
            match self.config.ranking {
                Ranking::NonDominated => non_dominated_sort(&self.problem, elements),
                Ranking::StrengthPareto => strength_pareto_sort(&self.problem, elements),
            }
        } else {
            elements.sort_by(|a, b| self.problem.compare(b, a));
            elements
        }
    }

    /// Truncates the ranked population to `size` (default: the configured
    /// population size). No-op when already within size.
    pub fn sieve(&mut self, size: Option<usize>) {
        let size = size.unwrap_or(self.config.population_size);
        self.population.truncate(size);
        self.emit(Signal::Sieved);
    }

    /// Publishes a new population, typically one built by a strategy.
    pub fn replace_population(&mut self, population: Vec<Element>) {
        self.population = population;
    }

    /// Records the step's score distribution into the statistics sink.
    ///
    /// Every objective component goes to the series named after its
    /// objective. For several objectives, per-element [`DOMINATORS`] and
    /// [`DOMINATED`] counts are added when the population is annotated.
    pub fn analyze(&mut self) {
        if let Some(sink) = self.statistics.as_mut() {
            let objectives = self.problem.objectives();
            let multi_objective = objectives.len() > 1;

            for element in &self.population {
                if let Some(evaluation) = element.evaluation() {
                    for (objective, &score) in objectives.iter().zip(evaluation) {
                        sink.add(&objective.name, score, self.step);
                    }
                }
                if multi_objective {
                    if let Some(pareto) = element.pareto() {
                        sink.add(DOMINATORS, pareto.dominators.len() as f64, self.step);
                        sink.add(DOMINATED, pareto.dominated.len() as f64, self.step);
                    }
                }
            }
        }
        self.emit(Signal::Analyzed);
    }

    /// Removes elements whose decision values are all within `precision`
    /// of an element kept before them, and returns the remaining size.
    ///
    /// O(n²); meant for occasional diagnostics, not every step.
    pub fn nub(&mut self, precision: f64) -> usize {
        let mut kept: Vec<Element> = Vec::with_capacity(self.population.len());
        for element in std::mem::take(&mut self.population) {
            if !kept.iter().any(|k| within(k.values(), element.values(), precision)) {
                kept.push(element);
            }
        }
        self.population = kept;
        self.population.len()
    }

    /// Puts the search back in the unstarted state and clears statistics.
    pub fn reset(&mut self) {
        self.step = -1;
        if let Some(sink) = self.statistics.as_mut() {
            sink.clear();
        }
    }

    pub(super) fn emit(&mut self, signal: Signal) {
        self.signals.emit(
            signal,
            &Event {
                step: self.step,
                population: &self.population,
                evaluated: None,
            },
        );
    }
}

impl<P: Problem> std::fmt::Debug for Search<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Search")
            .field("config", &self.config)
            .field("step", &self.step)
            .field("population", &self.population.len())
            .field("signals", &self.signals)
            .finish()
    }
}

fn within(a: &[f64], b: &[f64], precision: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= precision)
}

fn score<P: Problem>(problem: &P, element: Element) -> Result<Element, EngineError> {
    let evaluation = problem.evaluate(&element)?;
    let expected = problem.objectives().len();
    if evaluation.len() != expected {
        return Err(EngineError::ObjectiveMismatch {
            expected,
            actual: evaluation.len(),
        });
    }
    Ok(element.with_evaluation(evaluation))
}

/// Evaluate a batch, in parallel or sequentially. Output order matches input.
#[cfg(feature = "parallel")]
fn evaluate_elements<P: Problem>(
    problem: &P,
    elements: Vec<Element>,
    parallel: bool,
) -> Result<Vec<Element>, EngineError> {
    if parallel {
        elements
            .into_par_iter()
            .map(|element| score(problem, element))
            .collect()
    } else {
        elements
            .into_iter()
            .map(|element| score(problem, element))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_elements<P: Problem>(
    problem: &P,
    elements: Vec<Element>,
    _parallel: bool,
) -> Result<Vec<Element>, EngineError> {
    elements
        .into_iter()
        .map(|element| score(problem, element))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
