//! Particle Swarm Optimization.
//!
//! A [`Strategy`](crate::engine::Strategy) for the engine that replaces the
//! expand/evaluate/sieve update with velocity-driven movement of every
//! element. Particles are pulled towards their own best-so-far position and
//! towards the best element the swarm has found.
//!
//! # Key Types
//!
//! - [`SwarmConfig`]: Inertia and the two acceleration bounds
//! - [`ParticleSwarm`]: The strategy; also exposes per-particle state
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), *Particle Swarm Optimization*
//! - Clerc & Kennedy (2002), *The Particle Swarm: Explosion, Stability, and
//!   Convergence in a Multidimensional Complex Space*

mod config;
mod swarm;

pub use config::SwarmConfig;
pub use swarm::ParticleSwarm;
