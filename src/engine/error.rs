//! Error types.

use thiserror::Error;

/// Failure reported by [`Problem::evaluate`](super::Problem::evaluate).
///
/// ```
/// use u_swarm::engine::EvaluationError;
///
/// let err = EvaluationError::new("simulator timed out");
/// assert_eq!(err.to_string(), "simulator timed out");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EvaluationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl EvaluationError {
    /// Creates an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message, without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by engine operations.
///
/// Every failure is returned by the operation that met it; the population
/// is left as of the last completed step.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The problem failed to evaluate an element.
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// An evaluation returned the wrong number of scores.
    #[error("evaluation returned {actual} scores, expected {expected}")]
    ObjectiveMismatch {
        /// Number of objectives declared by the problem.
        expected: usize,
        /// Number of scores returned.
        actual: usize,
    },

    /// An operation needed at least one element.
    #[error("population is empty")]
    EmptyPopulation,
}
