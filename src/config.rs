// Simulator configuration
// Read once from the process environment (optionally seeded by a .env file)

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{SimError, SimResult};

pub const DEFAULT_SBDB_URL: &str = "https://ssd-api.jpl.nasa.gov/sbdb.api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// SBDB endpoint used for live asteroid lookups
    pub sbdb_url: String,
    /// HTTP timeout for live lookups (seconds)
    pub http_timeout_secs: u64,
    /// How long a live record stays valid in the cache (seconds)
    pub cache_ttl_secs: u64,
    /// Population density used when the caller supplies none (people/km²)
    pub default_population_density: f64,
    /// Ocean depth assumed by the tsunami model (m)
    pub ocean_depth_m: f64,
    /// Entry angles below this are clamped up to it (degrees)
    pub min_entry_angle_deg: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sbdb_url: DEFAULT_SBDB_URL.to_string(),
            http_timeout_secs: 30,
            cache_ttl_secs: 3600,
            default_population_density: 1000.0,
            ocean_depth_m: crate::physics_engine::DEFAULT_OCEAN_DEPTH_M,
            min_entry_angle_deg: crate::physics_engine::MIN_ENTRY_ANGLE_DEG,
        }
    }
}

impl SimulatorConfig {
    /// Build the configuration from `.env` + process environment.
    pub fn from_env() -> SimResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> SimResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            sbdb_url: lookup("METEOR_SBDB_URL").unwrap_or(defaults.sbdb_url),
            http_timeout_secs: parse_var(&lookup, "METEOR_HTTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.http_timeout_secs),
            cache_ttl_secs: parse_var(&lookup, "METEOR_CACHE_TTL_SECS")?
                .unwrap_or(defaults.cache_ttl_secs),
            default_population_density: parse_var(&lookup, "METEOR_DEFAULT_POPULATION_DENSITY")?
                .unwrap_or(defaults.default_population_density),
            ocean_depth_m: parse_var(&lookup, "METEOR_OCEAN_DEPTH_M")?
                .unwrap_or(defaults.ocean_depth_m),
            min_entry_angle_deg: parse_var(&lookup, "METEOR_MIN_ENTRY_ANGLE_DEG")?
                .unwrap_or(defaults.min_entry_angle_deg),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SimResult<()> {
        if self.default_population_density < 0.0 {
            return Err(SimError::Config(
                "METEOR_DEFAULT_POPULATION_DENSITY must be >= 0".into(),
            ));
        }
        if self.ocean_depth_m <= 0.0 {
            return Err(SimError::Config("METEOR_OCEAN_DEPTH_M must be > 0".into()));
        }
        if !(self.min_entry_angle_deg > 0.0 && self.min_entry_angle_deg < 90.0) {
            return Err(SimError::Config(
                "METEOR_MIN_ENTRY_ANGLE_DEG must be in (0, 90)".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> SimResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SimError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
