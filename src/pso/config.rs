//! Swarm configuration.

/// Velocity-update parameters for [`ParticleSwarm`](super::ParticleSwarm).
///
/// Non-finite or negative values are coerced to the defaults.
///
/// # Examples
///
/// ```
/// use u_swarm::pso::SwarmConfig;
///
/// let config = SwarmConfig::default()
///     .with_inertia(0.7)
///     .with_local_acceleration(1.5)
///     .with_global_acceleration(1.5);
/// assert_eq!(config.inertia, 0.7);
///
/// let coerced = SwarmConfig::default().with_inertia(-1.0);
/// assert_eq!(coerced.inertia, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwarmConfig {
    /// Weight of the previous velocity.
    ///
    /// Values below 1 damp the swarm; 0 removes momentum entirely.
    pub inertia: f64,

    /// Upper bound of the random pull towards a particle's own best.
    pub local_acceleration: f64,

    /// Upper bound of the random pull towards the swarm's best.
    pub global_acceleration: f64,
}

const DEFAULT_INERTIA: f64 = 1.0;
const DEFAULT_LOCAL_ACCELERATION: f64 = 0.5;
const DEFAULT_GLOBAL_ACCELERATION: f64 = 0.3;

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            inertia: DEFAULT_INERTIA,
            local_acceleration: DEFAULT_LOCAL_ACCELERATION,
            global_acceleration: DEFAULT_GLOBAL_ACCELERATION,
        }
    }
}

impl SwarmConfig {
    pub fn with_inertia(mut self, inertia: f64) -> Self {
        self.inertia = inertia;
        self.normalized()
    }

    pub fn with_local_acceleration(mut self, acceleration: f64) -> Self {
        self.local_acceleration = acceleration;
        self.normalized()
    }

    pub fn with_global_acceleration(mut self, acceleration: f64) -> Self {
        self.global_acceleration = acceleration;
        self.normalized()
    }

    /// Returns a copy with malformed values replaced by defaults.
    pub fn normalized(self) -> Self {
        Self {
            inertia: coerce("inertia", self.inertia, DEFAULT_INERTIA),
            local_acceleration: coerce(
                "local_acceleration",
                self.local_acceleration,
                DEFAULT_LOCAL_ACCELERATION,
            ),
            global_acceleration: coerce(
                "global_acceleration",
                self.global_acceleration,
                DEFAULT_GLOBAL_ACCELERATION,
            ),
        }
    }
}

fn coerce(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::debug!(parameter = name, value, default, "swarm parameter coerced to default");
        default
    }
}
