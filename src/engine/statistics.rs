//! Statistics sinks.
//!
//! The engine reports per-step distributions and timings to a
//! [`StatisticsSink`]. [`Statistics`] is the in-memory implementation:
//! one named [`Series`] of `(context, value)` samples per statistic.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Report target for named time-series statistics.
///
/// `context` tags each sample, the engine passes the current step.
pub trait StatisticsSink: Send {
    /// Adds one sample to the named statistic.
    fn add(&mut self, stat: &str, value: f64, context: i64);

    /// Starts a timer on the named statistic.
    fn start_time(&mut self, stat: &str);

    /// Adds the seconds elapsed since the last [`start_time`](Self::start_time)
    /// as a sample. Without a running timer nothing is recorded.
    fn add_time(&mut self, stat: &str, context: i64);

    /// Drops every recorded sample.
    fn clear(&mut self);
}

/// One recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Tag supplied when the sample was added (the engine step).
    pub context: i64,
    /// Sample value.
    pub value: f64,
}

/// Summary of the samples sharing one context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of samples.
    pub count: usize,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

/// Accumulator for a single named statistic.
#[derive(Debug, Clone, Default)]
pub struct Series {
    samples: Vec<Sample>,
    started: Option<Instant>,
}

impl Series {
    /// Appends a sample.
    pub fn add(&mut self, value: f64, context: i64) {
        self.samples.push(Sample { context, value });
    }

    /// Starts (or restarts) the timer.
    pub fn start_time(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Records elapsed seconds since [`start_time`](Self::start_time) and
    /// stops the timer.
    pub fn add_time(&mut self, context: i64) {
        if let Some(started) = self.started.take() {
            self.add(started.elapsed().as_secs_f64(), context);
        }
    }

    /// All samples in insertion order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Values recorded under `context`.
    pub fn values_at(&self, context: i64) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| s.context == context)
            .map(|s| s.value)
            .collect()
    }

    /// Distribution summary of the samples recorded under `context`.
    pub fn summary(&self, context: i64) -> Option<Summary> {
        let values = self.values_at(context);
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Summary {
            count: values.len(),
            min,
            max,
            mean,
        })
    }
}

/// In-memory statistics keyed by name.
///
/// ```
/// use u_swarm::engine::{Statistics, StatisticsSink};
///
/// let mut stats = Statistics::default();
/// stats.add("cost", 3.0, 0);
/// stats.add("cost", 1.0, 0);
/// let summary = stats.series("cost").and_then(|s| s.summary(0)).unwrap();
/// assert_eq!(summary.count, 2);
/// assert_eq!(summary.min, 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    series: BTreeMap<String, Series>,
}

impl Statistics {
    /// Accumulator for `stat`, created on first use.
    pub fn stat(&mut self, stat: &str) -> &mut Series {
        self.series.entry(stat.to_owned()).or_default()
    }

    /// The named series, if anything was recorded.
    pub fn series(&self, stat: &str) -> Option<&Series> {
        self.series.get(stat)
    }

    /// Names of all recorded statistics, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl StatisticsSink for Statistics {
    fn add(&mut self, stat: &str, value: f64, context: i64) {
        self.stat(stat).add(value, context);
    }

    fn start_time(&mut self, stat: &str) {
        self.stat(stat).start_time();
    }

    fn add_time(&mut self, stat: &str, context: i64) {
        self.stat(stat).add_time(context);
    }

    fn clear(&mut self) {
        self.series.clear();
    }
}

/// Shared sink: lets a caller keep a handle while the engine reports into it.
///
/// A poisoned lock is recovered, samples are plain data.
impl<T: StatisticsSink> StatisticsSink for Arc<Mutex<T>> {
    fn add(&mut self, stat: &str, value: f64, context: i64) {
        self.lock().unwrap_or_else(|e| e.into_inner()).add(stat, value, context);
    }

    fn start_time(&mut self, stat: &str) {
        self.lock().unwrap_or_else(|e| e.into_inner()).start_time(stat);
    }

    fn add_time(&mut self, stat: &str, context: i64) {
        self.lock().unwrap_or_else(|e| e.into_inner()).add_time(stat, context);
    }

    fn clear(&mut self) {
        self.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
