//! Particle-swarm update strategy.

use super::config::SwarmConfig;
use crate::engine::{Element, ElementId, EngineError, Problem, Search, Strategy};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-particle state carried between steps.
#[derive(Debug, Clone)]
struct Motion {
    velocity: Vec<f64>,
    /// `None` while the particle itself is its best-so-far.
    local_best: Option<Element>,
}

/// Particle-swarm optimization as an engine [`Strategy`].
///
/// Every element of the population is a particle. Instead of expanding and
/// sieving, each step moves every particle:
///
/// ```text
/// v' = v × inertia + l × (local_best − x) + g × (global_best − x)
/// x' = clamp(x + v', 0, cardinality − 1)
/// ```
///
/// with `l ∈ [0, local_acceleration)` and `g ∈ [0, global_acceleration)`
/// drawn once per particle and step. The moved particles are evaluated as
/// one batch, ranked, and replace the population. The population size
/// stays constant.
///
/// Particle state is keyed by [`ElementId`], so it survives re-ranking.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_swarm::engine::{model, Dimension, Element, Engine, EngineConfig, EvaluationError, Objective, Problem};
/// use u_swarm::pso::{ParticleSwarm, SwarmConfig};
///
/// struct Bowl {
///     objectives: Vec<Objective>,
///     model: Arc<[Dimension]>,
/// }
///
/// impl Problem for Bowl {
///     fn objectives(&self) -> &[Objective] { &self.objectives }
///     fn model(&self) -> Arc<[Dimension]> { Arc::clone(&self.model) }
///     fn evaluate(&self, e: &Element) -> Result<Vec<f64>, EvaluationError> {
///         Ok(vec![e.values().iter().map(|x| (x - 50.0).powi(2)).sum()])
///     }
/// }
///
/// let problem = Bowl {
///     objectives: vec![Objective::minimize("distance")],
///     model: model(&[101, 101]),
/// };
/// let config = EngineConfig::default()
///     .with_population_size(20)
///     .with_max_steps(30)
///     .with_seed(3);
/// let swarm = ParticleSwarm::new(SwarmConfig::default().with_inertia(0.6));
///
/// let mut engine = Engine::with_strategy(problem, config, swarm);
/// let best = engine.run().unwrap();
/// assert_eq!(engine.population().len(), 20);
/// assert!(engine.strategy().global_best().is_some());
/// assert!(best.score(0).unwrap().is_finite());
/// ```
///
/// # References
///
/// - Kennedy & Eberhart (1995), *Particle Swarm Optimization*
/// - Shi & Eberhart (1998), *A Modified Particle Swarm Optimizer*
#[derive(Debug, Clone, Default)]
pub struct ParticleSwarm {
    config: SwarmConfig,
    motions: HashMap<ElementId, Motion>,
    global_best: Option<Element>,
}

impl ParticleSwarm {
    /// Creates a swarm strategy. Malformed parameters are coerced.
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            config: config.normalized(),
            motions: HashMap::new(),
            global_best: None,
        }
    }

    /// Effective parameters.
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Best element found so far, set on the first update.
    pub fn global_best(&self) -> Option<&Element> {
        self.global_best.as_ref()
    }

    /// Current velocity of the particle with `id`.
    pub fn velocity(&self, id: ElementId) -> Option<&[f64]> {
        self.motions.get(&id).map(|m| m.velocity.as_slice())
    }

    /// Best-so-far element of `element`'s particle; the element itself
    /// unless something better was recorded.
    pub fn local_best<'a>(&'a self, element: &'a Element) -> &'a Element {
        self.motions
            .get(&element.id())
            .and_then(|m| m.local_best.as_ref())
            .unwrap_or(element)
    }

    /// Computes the next velocity of `element`, drawing both coefficients
    /// from `rng`. A particle without recorded motion starts at rest.
    pub fn next_velocity<R: Rng>(&self, element: &Element, global_best: &Element, rng: &mut R) -> Vec<f64> {
        let local = self.config.local_acceleration * rng.random::<f64>();
        let global = self.config.global_acceleration * rng.random::<f64>();

        let position = element.values();
        let local_best = self.local_best(element).values();
        let previous = self.velocity(element.id());

        position
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let v = previous.and_then(|v| v.get(i)).copied().unwrap_or(0.0);
                v * self.config.inertia + local * (local_best[i] - x) + global * (global_best.values()[i] - x)
            })
            .collect()
    }

    /// Moves `element` by `velocity`, clamped to the model bounds, as a
    /// new unevaluated element.
    pub fn next_position(element: &Element, velocity: &[f64]) -> Element {
        let values = element
            .values()
            .iter()
            .zip(velocity)
            .zip(element.model())
            .map(|((x, v), dimension)| dimension.clamp(x + v))
            .collect();
        Element::new(values, element.model_handle())
    }
}

impl<P: Problem> Strategy<P> for ParticleSwarm {
    fn initiate(&mut self, search: &mut Search<P>, size: usize) {
        search.initiate(size);

        let particles: Vec<_> = search
            .population()
            .iter()
            .map(|e| (e.id(), e.model_handle()))
            .collect();
        let rng = search.rng();
        self.motions = particles
            .into_iter()
            .map(|(id, model)| {
                let velocity = model
                    .iter()
                    .map(|d| rng.random_range(-1.0..=1.0) * d.range())
                    .collect();
                (
                    id,
                    Motion {
                        velocity,
                        local_best: None,
                    },
                )
            })
            .collect();
        self.global_best = None;
    }

    fn update(&mut self, search: &mut Search<P>) -> Result<(), EngineError> {
        let global_best = match &self.global_best {
            Some(best) => best.clone(),
            None => search.best()?.clone(),
        };

        let particles = search.population().to_vec();
        let mut velocities = Vec::with_capacity(particles.len());
        let mut candidates = Vec::with_capacity(particles.len());
        for particle in &particles {
            let velocity = self.next_velocity(particle, &global_best, search.rng());
            candidates.push(Self::next_position(particle, &velocity));
            velocities.push(velocity);
        }

        let moved = search.evaluate_batch(candidates)?;

        let problem = search.problem();
        let motions: HashMap<_, _> = particles
            .iter()
            .zip(&moved)
            .zip(velocities)
            .map(|((previous, candidate), velocity)| {
                let inherited = self.local_best(previous);
                let local_best = if problem.compare(candidate, inherited) == Ordering::Greater {
                    None
                } else {
                    Some(inherited.clone())
                };
                (candidate.id(), Motion { velocity, local_best })
            })
            .collect();

        let ranked = search.rank(moved);
        search.replace_population(ranked);
        self.motions = motions;

        let best = search.best()?;
        self.global_best = if search.problem().compare(best, &global_best) == Ordering::Greater {
            Some(best.clone())
        } else {
            Some(global_best)
        };
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Counter, Sphere, TwoTargets};
    use crate::engine::{model, Engine, EngineConfig, Signal};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::Ordering as AtomicOrdering;
    use std::sync::{Arc, Mutex};

    fn engine_config(size: usize, steps: usize) -> EngineConfig {
        EngineConfig::default()
            .with_population_size(size)
            .with_max_steps(steps)
            .with_seed(11)
            .with_parallel(false)
    }

    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
    }

    #[test]
    fn test_initial_velocities_within_range() {
        let problem = Sphere::new(3, 21);
        let mut engine = Engine::with_strategy(problem, engine_config(10, 5), ParticleSwarm::default());
        engine.advance().unwrap();

        for element in engine.population() {
            let velocity = engine.strategy().velocity(element.id()).unwrap();
            assert_eq!(velocity.len(), 3);
            assert!(velocity.iter().all(|v| (-21.0..=21.0).contains(v)));
            // local best starts as the particle itself
            assert_eq!(engine.strategy().local_best(element).id(), element.id());
        }
        assert!(engine.strategy().global_best().is_none());
    }

    #[test]
    fn test_population_size_constant() {
        let mut engine = Engine::with_strategy(Sphere::new(2, 31), engine_config(7, 6), ParticleSwarm::default());
        while !engine.is_finished() {
            engine.advance().unwrap();
            assert_eq!(engine.population().len(), 7);
            for element in engine.population() {
                assert!(element.is_evaluated());
                assert!(engine.strategy().velocity(element.id()).is_some());
            }
        }
    }

    #[test]
    fn test_single_particle_approaches_global_best() {
        let swarm = ParticleSwarm::new(
            SwarmConfig::default()
                .with_inertia(0.0)
                .with_local_acceleration(0.0)
                .with_global_acceleration(1.0),
        );
        let mut engine = Engine::with_strategy(Sphere::new(2, 101), engine_config(1, 20), swarm);
        engine.advance().unwrap();

        let mut last = f64::INFINITY;
        while !engine.is_finished() {
            engine.advance().unwrap();
            let global_best = engine.strategy().global_best().unwrap();
            let d = distance(engine.population()[0].values(), global_best.values());
            assert!(d <= last + 1e-9);
            last = d;
        }
    }

    #[test]
    fn test_global_pull_moves_towards_best() {
        let swarm = ParticleSwarm::new(
            SwarmConfig::default()
                .with_inertia(0.0)
                .with_local_acceleration(0.0)
                .with_global_acceleration(1.0),
        );
        let m = model(&[101]);
        let particle = Element::new(vec![10.0], Arc::clone(&m));
        let best = Element::new(vec![60.0], m);

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let velocity = swarm.next_velocity(&particle, &best, &mut rng);
            assert!((0.0..50.0).contains(&velocity[0]));
            let moved = ParticleSwarm::next_position(&particle, &velocity);
            assert!(distance(moved.values(), best.values()) <= 50.0);
        }
    }

    #[test]
    fn test_inertia_only_velocity() {
        let mut engine = Engine::with_strategy(
            Sphere::new(2, 51),
            engine_config(4, 5),
            ParticleSwarm::new(
                SwarmConfig::default()
                    .with_inertia(0.5)
                    .with_local_acceleration(0.0)
                    .with_global_acceleration(0.0),
            ),
        );
        engine.advance().unwrap();

        let swarm = engine.strategy();
        let global_best = engine.population()[0].clone();
        let mut rng = StdRng::seed_from_u64(0);
        for element in engine.population() {
            let previous = swarm.velocity(element.id()).unwrap();
            let next = swarm.next_velocity(element, &global_best, &mut rng);
            for (n, p) in next.iter().zip(previous) {
                assert!((n - 0.5 * p).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_positions_clamped() {
        let m = model(&[10, 10]);
        let particle = Element::new(vec![8.0, 1.0], m);
        let moved = ParticleSwarm::next_position(&particle, &[5.0, -5.0]);
        assert_eq!(moved.values(), &[9.0, 0.0]);
        assert_ne!(moved.id(), particle.id());
        assert!(!moved.is_evaluated());
    }

    #[test]
    fn test_global_best_dominates_local_bests() {
        let mut engine = Engine::with_strategy(Sphere::new(3, 41), engine_config(12, 10), ParticleSwarm::default());
        engine.advance().unwrap();

        let mut previous_best: Option<f64> = None;
        while !engine.is_finished() {
            engine.advance().unwrap();
            let swarm = engine.strategy();
            let global_best = swarm.global_best().unwrap().score(0).unwrap();
            for element in engine.population() {
                let local_best = swarm.local_best(element).score(0).unwrap();
                assert!(global_best <= local_best);
                assert!(local_best <= element.score(0).unwrap());
            }
            if let Some(previous) = previous_best {
                assert!(global_best <= previous);
            }
            previous_best = Some(global_best);
        }
    }

    #[test]
    fn test_no_expand_or_sieve_signals() {
        let mut engine = Engine::with_strategy(Sphere::new(2, 11), engine_config(5, 3), ParticleSwarm::default());
        engine.advance().unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        engine.on(move |signal, _| sink.lock().unwrap().push(signal));
        engine.advance().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![Signal::Updated, Signal::Analyzed, Signal::Advanced]
        );
    }

    #[test]
    fn test_failed_update_keeps_state() {
        let mut engine = Engine::with_strategy(Counter::minimizing(), engine_config(4, 10), ParticleSwarm::default());
        engine.advance().unwrap();
        engine.advance().unwrap();
        let ids: Vec<_> = engine.population().iter().map(|e| e.id()).collect();
        let global_best = engine.strategy().global_best().map(|e| e.id());

        engine.search().problem().fail.store(true, AtomicOrdering::SeqCst);
        assert!(matches!(engine.advance(), Err(EngineError::Evaluation(_))));

        let after: Vec<_> = engine.population().iter().map(|e| e.id()).collect();
        assert_eq!(ids, after);
        assert_eq!(engine.strategy().global_best().map(|e| e.id()), global_best);
        for id in ids {
            assert!(engine.strategy().velocity(id).is_some());
        }
    }

    #[test]
    fn test_multi_objective_swarm() {
        let mut engine = Engine::with_strategy(TwoTargets::new(), engine_config(6, 5), ParticleSwarm::default());
        engine.run().unwrap();
        assert_eq!(engine.population().len(), 6);
        assert!(!engine.search().pareto_front().is_empty());
        assert!(engine
            .population()
            .iter()
            .all(|e| (0.0..=10.0).contains(&e.values()[0])));
    }

    #[test]
    fn test_sphere_converges() {
        let problem = Sphere::new(2, 101);
        let centre = problem.centre();
        let swarm = ParticleSwarm::new(SwarmConfig::default().with_inertia(0.5));
        let mut engine = Engine::with_strategy(problem, engine_config(20, 40), swarm);

        engine.run().unwrap();

        let best = engine.strategy().global_best().unwrap();
        assert!(distance(best.values(), &centre) < 15.0);
    }
}
