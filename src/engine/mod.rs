//! Population-based optimization engine.
//!
//! A generic search pipeline over numeric decision vectors. Users describe
//! their problem by implementing [`Problem`]: the objectives, the domain
//! model, and how an [`Element`] is scored. The engine keeps a ranked
//! population and iterates initiate → expand → evaluate → sieve until a
//! step limit or the problem's own sufficiency test stops it.
//!
//! # Core Traits
//!
//! - [`Problem`]: Problem definition: objectives, model, evaluation
//! - [`Strategy`]: Per-step update rule; [`Standard`] is the default pipeline
//! - [`StatisticsSink`]: Target for per-step statistics
//!
//! # Key Types
//!
//! - [`EngineConfig`]: Population size, step limit, expansion rate, ranking
//! - [`Engine`]: Iteration state machine (`advance`, `run`)
//! - [`Search`]: Population state and the base pipeline operations
//! - [`Signal`] / [`Event`]: Lifecycle notifications for listeners
//!
//! # Submodules
//!
//! - [`multi_objective`]: Pareto dominance, non-dominated sorting, crowding
//!   distance and strength ranking
//!
//! # References
//!
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*
//! - Zitzler, Laumanns & Thiele (2001), *SPEA2: Improving the Strength
//!   Pareto Evolutionary Algorithm*

mod config;
mod error;
pub mod multi_objective;
mod runner;
mod search;
mod signals;
mod statistics;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use config::{EngineConfig, Ranking};
pub use error::{EngineError, EvaluationError};
pub use runner::{Engine, Standard, Strategy};
pub use search::{Search, DOMINATED, DOMINATORS, EVALUATION_TIME};
pub use signals::{Event, Signal, Signals};
pub use statistics::{Sample, Series, Statistics, StatisticsSink, Summary};
pub use types::{model, Dimension, Direction, Element, ElementId, Objective, Pareto, Problem};
