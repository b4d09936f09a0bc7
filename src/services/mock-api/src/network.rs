//! Network Simulation Module
//!
//! Named network-condition presets and the randomness source used to sample
//! latency and spontaneous failures for mock requests.

use crate::models::NetworkConfig;
use crate::MockApiError;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Named network conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPreset {
    Fast,
    Normal,
    Slow,
    Unstable,
    Offline,
}

impl NetworkPreset {
    pub const ALL: [NetworkPreset; 5] = [
        NetworkPreset::Fast,
        NetworkPreset::Normal,
        NetworkPreset::Slow,
        NetworkPreset::Unstable,
        NetworkPreset::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkPreset::Fast => "fast",
            NetworkPreset::Normal => "normal",
            NetworkPreset::Slow => "slow",
            NetworkPreset::Unstable => "unstable",
            NetworkPreset::Offline => "offline",
        }
    }

    /// Latency range, timeout and failure rate assigned by the preset.
    ///
    /// The slow-response threshold is not part of a preset; it is carried over
    /// from `current`.
    pub fn apply_to(&self, current: &NetworkConfig) -> NetworkConfig {
        let (latency_min_ms, latency_max_ms, timeout_ms, failure_rate) = match self {
            NetworkPreset::Fast => (50, 150, 5_000, 0.001),
            NetworkPreset::Normal => (200, 700, 10_000, 0.01),
            NetworkPreset::Slow => (1_000, 3_000, 15_000, 0.05),
            NetworkPreset::Unstable => (500, 5_000, 8_000, 0.15),
            // failure rate 1.0 trips every roll
            NetworkPreset::Offline => (0, 0, 1_000, 1.0),
        };

        NetworkConfig {
            latency_min_ms,
            latency_max_ms,
            timeout_ms,
            failure_rate,
            slow_response_threshold_ms: current.slow_response_threshold_ms,
        }
    }
}

impl fmt::Display for NetworkPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkPreset {
    type Err = MockApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(NetworkPreset::Fast),
            "normal" => Ok(NetworkPreset::Normal),
            "slow" => Ok(NetworkPreset::Slow),
            "unstable" => Ok(NetworkPreset::Unstable),
            "offline" => Ok(NetworkPreset::Offline),
            _ => Err(MockApiError::UnknownPreset(s.to_string())),
        }
    }
}

/// Seedable source of simulated latency and failures
pub struct NetworkSimulator {
    rng: Mutex<StdRng>,
}

impl NetworkSimulator {
    /// Simulator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic simulator for tests and reproducible sessions
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform latency in `[latency_min, latency_max]`
    pub fn sample_latency(&self, config: &NetworkConfig) -> Duration {
        let (min, max) = config.latency_range();
        let (low, high) = if min <= max { (min, max) } else { (max, min) };

        if low == high {
            return low;
        }

        self.rng.lock().gen_range(low..=high)
    }

    /// Delay for one mock request: the explicit delay if given, else a sampled
    /// latency, raised to the slow-response threshold when `slow` is set
    pub fn request_delay(
        &self,
        config: &NetworkConfig,
        explicit_delay_ms: Option<u64>,
        slow: bool,
    ) -> Duration {
        let delay = match explicit_delay_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.sample_latency(config),
        };

        if slow {
            delay.max(config.slow_response_threshold())
        } else {
            delay
        }
    }

    /// Roll against the configured failure rate
    pub fn should_fail(&self, config: &NetworkConfig) -> bool {
        if config.failure_rate <= 0.0 {
            return false;
        }
        let roll: f64 = self.rng.lock().gen();
        roll < config.failure_rate
    }
}

impl Default for NetworkSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NetworkSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkSimulator").finish_non_exhaustive()
    }
}
