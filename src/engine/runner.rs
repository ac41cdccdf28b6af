//! Iteration state machine.
//!
//! [`Engine`] drives a [`Search`] through
//! UNSTARTED → RUNNING → FINISHED, one [`advance`](Engine::advance) at a
//! time. The per-step update is delegated to a [`Strategy`]; the default
//! [`Standard`] strategy expands, evaluates and sieves.

use super::config::EngineConfig;
use super::error::EngineError;
use super::search::Search;
use super::signals::{Event, Signal};
use super::types::{Element, Problem};

/// Update rule plugged into the engine.
///
/// Both methods have defaults implementing the standard pipeline, so an
/// algorithm overrides only what it changes.
pub trait Strategy<P: Problem> {
    /// Builds the initial population. Evaluation follows automatically.
    fn initiate(&mut self, search: &mut Search<P>, size: usize) {
        search.initiate(size);
    }

    /// Performs one update step on a started search.
    ///
    /// The default expands, evaluates and sieves. It re-evaluates the whole
    /// population (old and new elements) unless
    /// [`EngineConfig::rescore_population`] is off.
    fn update(&mut self, search: &mut Search<P>) -> Result<(), EngineError> {
        search.expand(None);
        if search.config().rescore_population {
            search.evaluate()?;
        } else {
            search.evaluate_pending()?;
        }
        search.sieve(None);
        Ok(())
    }
}

/// The default expand → evaluate → sieve update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl<P: Problem> Strategy<P> for Standard {}

/// Drives a search to termination.
///
/// # Usage
///
/// ```
/// use std::sync::Arc;
/// use u_swarm::engine::{model, Dimension, Element, Engine, EngineConfig, EvaluationError, Objective, Problem};
///
/// struct Parabola {
///     objectives: Vec<Objective>,
///     model: Arc<[Dimension]>,
/// }
///
/// impl Problem for Parabola {
///     fn objectives(&self) -> &[Objective] { &self.objectives }
///     fn model(&self) -> Arc<[Dimension]> { Arc::clone(&self.model) }
///     fn evaluate(&self, e: &Element) -> Result<Vec<f64>, EvaluationError> {
///         Ok(vec![(e.values()[0] - 30.0).powi(2)])
///     }
/// }
///
/// let problem = Parabola {
///     objectives: vec![Objective::minimize("error")],
///     model: model(&[100]),
/// };
/// let config = EngineConfig::default()
///     .with_population_size(20)
///     .with_max_steps(10)
///     .with_seed(42);
///
/// let mut engine = Engine::new(problem, config);
/// let best = engine.run().unwrap();
/// assert_eq!(engine.step(), 9);
/// assert!(best.score(0).unwrap() < 100.0);
/// ```
pub struct Engine<P: Problem, S = Standard> {
    search: Search<P>,
    strategy: S,
}

impl<P: Problem> Engine<P, Standard> {
    /// Creates an engine running the standard update.
    pub fn new(problem: P, config: EngineConfig) -> Self {
        Self::with_strategy(problem, config, Standard)
    }
}

impl<P: Problem, S: Strategy<P>> Engine<P, S> {
    /// Creates an engine running `strategy`.
    pub fn with_strategy(problem: P, config: EngineConfig, strategy: S) -> Self {
        Self::from_search(Search::new(problem, config), strategy)
    }

    /// Wraps a prepared search (custom RNG, statistics, listeners).
    pub fn from_search(search: Search<P>, strategy: S) -> Self {
        Self { search, strategy }
    }

    /// Underlying search state.
    pub fn search(&self) -> &Search<P> {
        &self.search
    }

    /// Mutable search state, for calling individual phases.
    pub fn search_mut(&mut self) -> &mut Search<P> {
        &mut self.search
    }

    /// The update strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Splits the engine into its search state and strategy.
    pub fn into_parts(self) -> (Search<P>, S) {
        (self.search, self.strategy)
    }

    /// Step counter: `-1` before the first advance.
    pub fn step(&self) -> i64 {
        self.search.step()
    }

    /// Current ranked population.
    pub fn population(&self) -> &[Element] {
        self.search.population()
    }

    /// Whether the termination condition holds.
    pub fn is_finished(&self) -> bool {
        self.search.is_finished()
    }

    /// Registers a lifecycle listener.
    pub fn on<F>(&mut self, listener: F)
    where
        F: FnMut(Signal, &Event<'_>) + Send + 'static,
    {
        self.search.on(listener);
    }

    /// Puts the engine back in the unstarted state.
    pub fn reset(&mut self) {
        self.search.reset();
    }

    /// Performs one pipeline step.
    ///
    /// Unstarted: reset, initiate the configured number of elements and
    /// evaluate them. Started: run the strategy's update. Then the step
    /// counter moves, the step is analysed and [`Signal::Advanced`] fires.
    ///
    /// On failure the population is restored to what it was before the
    /// call and the step counter does not move.
    pub fn advance(&mut self) -> Result<&mut Self, EngineError> {
        let checkpoint = self.search.population.clone();

        let outcome = if self.search.step < 0 {
            self.search.reset();
            let size = self.search.config().population_size;
            self.strategy.initiate(&mut self.search, size);
            self.search.evaluate()
        } else {
            self.strategy
                .update(&mut self.search)
                .map(|()| self.search.emit(Signal::Updated))
        };

        if let Err(err) = outcome {
            tracing::debug!(step = self.search.step, error = %err, "advance failed");
            self.search.population = checkpoint;
            return Err(err);
        }

        self.search.step += 1;
        tracing::debug!(
            step = self.search.step,
            population = self.search.population.len(),
            "advanced"
        );
        self.search.analyze();
        self.search.emit(Signal::Advanced);
        Ok(self)
    }

    /// Advances until finished, then returns the best-ranked element.
    pub fn run(&mut self) -> Result<Element, EngineError> {
        while !self.search.is_finished() {
            self.advance()?;
        }
        self.search.emit(Signal::Finished);

        let best = self.search.best()?.clone();
        tracing::info!(
            steps = self.search.step + 1,
            best = ?best.evaluation(),
            "run finished"
        );
        Ok(best)
    }
}

impl<P: Problem, S: std::fmt::Debug> std::fmt::Debug for Engine<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("search", &self.search)
            .field("strategy", &self.strategy)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::statistics::Statistics;
    use crate::engine::testing::{Counter, Sphere, TwoTargets};
    use std::sync::atomic::Ordering as AtomicOrdering;
    use std::sync::{Arc, Mutex};

    fn config(size: usize, steps: usize) -> EngineConfig {
        EngineConfig::default()
            .with_population_size(size)
            .with_max_steps(steps)
            .with_seed(42)
            .with_parallel(false)
    }

    fn record_signals<P: Problem, S: Strategy<P>>(engine: &mut Engine<P, S>) -> Arc<Mutex<Vec<Signal>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        engine.on(move |signal, _| sink.lock().unwrap().push(signal));
        log
    }

    #[test]
    fn test_run_performs_exactly_max_steps_advances() {
        for steps in [1, 2, 5] {
            let mut engine = Engine::new(Counter::minimizing(), config(4, steps));
            let log = record_signals(&mut engine);
            engine.run().unwrap();

            let advances = log.lock().unwrap().iter().filter(|&&s| s == Signal::Advanced).count();
            assert_eq!(advances, steps);
            assert_eq!(engine.step(), steps as i64 - 1);
            assert!(engine.is_finished());
        }
    }

    #[test]
    fn test_run_returns_minimal_observed_value() {
        let mut engine = Engine::new(Counter::minimizing(), config(5, 3));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        engine.on(move |signal, event| {
            if let (Signal::Evaluated, Some(evaluated)) = (signal, event.evaluated) {
                sink.lock()
                    .unwrap()
                    .extend(evaluated.iter().filter_map(|e| e.score(0)));
            }
        });

        let best = engine.run().unwrap();

        let min = observed.lock().unwrap().iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(best.score(0), Some(min));
        assert_eq!(min, 0.0);
    }

    #[test]
    fn test_first_advance_initiates_and_evaluates() {
        let mut engine = Engine::new(Counter::minimizing(), config(4, 10));
        let log = record_signals(&mut engine);
        assert_eq!(engine.step(), -1);

        engine.advance().unwrap();

        assert_eq!(engine.step(), 0);
        assert_eq!(engine.population().len(), 4);
        assert!(engine.population().iter().all(Element::is_evaluated));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Signal::Initiated,
                Signal::Evaluated,
                Signal::Analyzed,
                Signal::Advanced
            ]
        );
    }

    #[test]
    fn test_update_signal_order() {
        let mut engine = Engine::new(Counter::minimizing(), config(4, 2));
        engine.advance().unwrap();
        let log = record_signals(&mut engine);

        engine.run().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Signal::Expanded,
                Signal::Evaluated,
                Signal::Sieved,
                Signal::Updated,
                Signal::Analyzed,
                Signal::Advanced,
                Signal::Finished
            ]
        );
    }

    #[test]
    fn test_default_update_rescores_whole_population() {
        let mut engine = Engine::new(Counter::minimizing(), config(4, 10));
        engine.advance().unwrap();
        assert_eq!(engine.search().problem().evaluation_count(), 4);

        engine.advance().unwrap();
        // 4 old + 4 expanded, all re-evaluated
        assert_eq!(engine.search().problem().evaluation_count(), 12);
        assert_eq!(engine.population().len(), 4);
    }

    #[test]
    fn test_pending_only_update() {
        let config = config(4, 10).with_rescore_population(false);
        let mut engine = Engine::new(Counter::minimizing(), config);
        engine.advance().unwrap();
        engine.advance().unwrap();
        assert_eq!(engine.search().problem().evaluation_count(), 8);
    }

    #[test]
    fn test_population_size_stable_across_steps() {
        let mut engine = Engine::new(Counter::minimizing(), config(6, 5));
        while !engine.is_finished() {
            engine.advance().unwrap();
            assert_eq!(engine.population().len(), 6);
        }
    }

    #[test]
    fn test_sufficient_elements_stops_early() {
        let mut problem = Counter::minimizing();
        problem.sufficient_below = Some(1.0);
        let mut engine = Engine::new(problem, config(3, 50));

        let best = engine.run().unwrap();

        assert_eq!(engine.step(), 0);
        assert_eq!(best.score(0), Some(0.0));
    }

    #[test]
    fn test_failed_advance_restores_population() {
        let mut engine = Engine::new(Counter::minimizing(), config(3, 10));
        engine.advance().unwrap();
        let before: Vec<_> = engine.population().iter().map(|e| e.id()).collect();

        engine.search().problem().fail.store(true, AtomicOrdering::SeqCst);
        let err = engine.advance().unwrap_err();
        assert!(matches!(err, EngineError::Evaluation(_)));

        let after: Vec<_> = engine.population().iter().map(|e| e.id()).collect();
        assert_eq!(before, after);
        assert_eq!(engine.step(), 0);

        // The caller may retry the step
        engine.search().problem().fail.store(false, AtomicOrdering::SeqCst);
        engine.advance().unwrap();
        assert_eq!(engine.step(), 1);
    }

    #[test]
    fn test_failed_first_advance_stays_unstarted() {
        let problem = Counter::minimizing();
        problem.fail.store(true, AtomicOrdering::SeqCst);
        let mut engine = Engine::new(problem, config(3, 10));

        assert!(engine.run().is_err());
        assert_eq!(engine.step(), -1);
        assert!(engine.population().is_empty());
    }

    #[test]
    fn test_statistics_per_step() {
        let stats = Arc::new(Mutex::new(Statistics::default()));
        let search = Search::new(Counter::minimizing(), config(3, 3)).with_statistics(Arc::clone(&stats));
        let mut engine = Engine::from_search(search, Standard);

        engine.run().unwrap();

        let stats = stats.lock().unwrap();
        let series = stats.series("index").unwrap();
        for step in 0..3 {
            assert_eq!(series.values_at(step).len(), 3);
        }
        // One evaluation batch per advance
        assert_eq!(stats.series(crate::engine::EVALUATION_TIME).unwrap().samples().len(), 3);
    }

    #[test]
    fn test_rerun_after_reset() {
        let mut engine = Engine::new(Counter::minimizing(), config(3, 2));
        engine.run().unwrap();
        engine.reset();
        assert_eq!(engine.step(), -1);
        assert!(!engine.is_finished());
        engine.run().unwrap();
        assert_eq!(engine.step(), 1);
    }

    #[test]
    fn test_sphere_improves() {
        let problem = Sphere::new(3, 21);
        let mut engine = Engine::new(problem, config(30, 40));
        engine.advance().unwrap();
        let initial = engine.population()[0].score(0).unwrap();

        let best = engine.run().unwrap();

        // Elitist: ranked then truncated, the best never gets worse
        assert!(best.score(0).unwrap() <= initial);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Engine::new(Sphere::new(4, 11), config(16, 6)).run().unwrap();
        let parallel = Engine::new(Sphere::new(4, 11), config(16, 6).with_parallel(true))
            .run()
            .unwrap();
        assert_eq!(sequential.values(), parallel.values());
        assert_eq!(sequential.score(0), parallel.score(0));
    }

    #[test]
    fn test_multi_objective_run() {
        let mut engine = Engine::new(TwoTargets::new(), config(8, 6));
        let best = engine.run().unwrap();

        assert_eq!(best.dominator_count(), 0);
        let front = engine.search().pareto_front();
        assert!(!front.is_empty());
        // Every front member lies between the two optima
        for e in front {
            assert!((0.0..=4.0).contains(&e.values()[0]));
        }
    }
}
