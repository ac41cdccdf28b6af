//! Engine configuration.
//!
//! [`EngineConfig`] holds the parameters that control the iteration
//! pipeline. Malformed numeric values are coerced to defaults instead of
//! being rejected.

/// Multi-objective ranking strategy used by [`Search::sort`](super::Search::sort).
///
/// Ignored for single-objective problems, which sort by the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ranking {
    /// Fewest dominators first, ties broken by larger crowding distance
    /// (NSGA-II style).
    #[default]
    NonDominated,

    /// Lowest Pareto strength first (SPEA2 style).
    StrengthPareto,
}

/// Configuration for the engine.
///
/// # Defaults
///
/// ```
/// use u_swarm::engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_steps, 100);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_swarm::engine::{EngineConfig, Ranking};
///
/// let config = EngineConfig::default()
///     .with_population_size(40)
///     .with_max_steps(25)
///     .with_expansion_rate(0.5)
///     .with_ranking(Ranking::StrengthPareto)
///     .with_seed(7);
/// assert_eq!(config.population_size, 40);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Nominal number of elements kept after each sieve.
    pub population_size: usize,

    /// Number of advances performed by a run.
    pub max_steps: usize,

    /// Fraction of `population_size` generated by a default expansion.
    pub expansion_rate: f64,

    /// Ranking strategy for multi-objective problems.
    pub ranking: Ranking,

    /// Whether the default update re-evaluates the whole population
    /// (`true`) or only the newly expanded elements.
    pub rescore_population: bool,

    /// Whether to evaluate batches in parallel using rayon.
    ///
    /// Has no effect when the `parallel` feature is disabled.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

const DEFAULT_POPULATION_SIZE: usize = 100;
const DEFAULT_MAX_STEPS: usize = 100;
const DEFAULT_EXPANSION_RATE: f64 = 1.0;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: DEFAULT_POPULATION_SIZE,
            max_steps: DEFAULT_MAX_STEPS,
            expansion_rate: DEFAULT_EXPANSION_RATE,
            ranking: Ranking::default(),
            rescore_population: true,
            parallel: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Sets the population size (0 falls back to the default).
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self.normalized()
    }

    /// Sets the step limit (0 falls back to the default).
    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self.normalized()
    }

    /// Sets the expansion rate (non-finite or negative falls back to 1.0).
    pub fn with_expansion_rate(mut self, rate: f64) -> Self {
        self.expansion_rate = rate;
        self.normalized()
    }

    /// Sets the multi-objective ranking strategy.
    pub fn with_ranking(mut self, ranking: Ranking) -> Self {
        self.ranking = ranking;
        self
    }

    /// Chooses between whole-population and pending-only re-evaluation.
    pub fn with_rescore_population(mut self, rescore: bool) -> Self {
        self.rescore_population = rescore;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of elements produced by a default expansion.
    pub fn expansion_size(&self) -> usize {
        (self.expansion_rate * self.population_size as f64).floor() as usize
    }

    /// Returns a copy with malformed values replaced by defaults.
    pub fn normalized(mut self) -> Self {
        if self.population_size == 0 {
            tracing::debug!(
                default = DEFAULT_POPULATION_SIZE,
                "population_size of 0 coerced to default"
            );
            self.population_size = DEFAULT_POPULATION_SIZE;
        }
        if self.max_steps == 0 {
            tracing::debug!(default = DEFAULT_MAX_STEPS, "max_steps of 0 coerced to default");
            self.max_steps = DEFAULT_MAX_STEPS;
        }
        if !self.expansion_rate.is_finite() || self.expansion_rate < 0.0 {
            tracing::debug!(
                rate = self.expansion_rate,
                default = DEFAULT_EXPANSION_RATE,
                "expansion_rate coerced to default"
            );
            self.expansion_rate = DEFAULT_EXPANSION_RATE;
        }
        self
    }
}
