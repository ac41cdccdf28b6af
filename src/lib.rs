//! Population-based optimization engine.
//!
//! Provides a generic search pipeline and one specialization of it:
//!
//! - **Engine**: Iterative expand → evaluate → rank → sieve loop over a
//!   population of numeric decision vectors, with single-objective sorting
//!   or Pareto ranking (non-dominated sort with crowding distance, or
//!   strength ranking) for several objectives.
//! - **Particle Swarm (PSO)**: Replaces the update step with velocity and
//!   position updates driven by personal and swarm-wide bests.
//!
//! # Architecture
//!
//! The engine knows nothing about the problem domain. Users implement
//! [`engine::Problem`] to supply objectives, a domain model and an
//! evaluation function; algorithms plug in through [`engine::Strategy`].
//! Evaluation batches run on rayon when the `parallel` feature is enabled.

pub mod engine;
pub mod pso;
