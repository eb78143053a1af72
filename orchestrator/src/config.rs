use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::scheduler::OperationLatency;

const CONFIG_ENV: &str = "ORCHESTRATOR_CONFIG";
const SEARCH_PATHS: &[&str] = &[
    "./configs/orchestrator.toml",
    "./orchestrator.toml",
    "/etc/calcflow/orchestrator.toml",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the orchestrator listens on
    pub port: u16,
    /// Simulated cost of `+`, in milliseconds
    pub time_addition_ms: u64,
    /// Simulated cost of `-`, in milliseconds
    pub time_subtraction_ms: u64,
    /// Simulated cost of `*`, in milliseconds
    pub time_multiplications_ms: u64,
    /// Simulated cost of `/`, in milliseconds
    pub time_divisions_ms: u64,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            time_addition_ms: 5000,
            time_subtraction_ms: 5000,
            time_multiplications_ms: 10000,
            time_divisions_ms: 10000,
            shutdown_grace_secs: 10,
        }
    }
}

/// On-disk layout: everything lives under an `[orchestrator]` table.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    orchestrator: Config,
}

impl Config {
    /// Defaults, then the config file (if any), then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match find_config_file(std::env::var(CONFIG_ENV).ok()) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
        let file: ConfigFile = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {e}", path.display()))?;
        Ok(file.orchestrator)
    }

    /// Override individual keys from `lookup` (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.port = parse_override(&lookup, "ORCHESTRATOR_PORT", self.port)?;
        self.time_addition_ms =
            parse_override(&lookup, "TIME_ADDITION_MS", self.time_addition_ms)?;
        self.time_subtraction_ms =
            parse_override(&lookup, "TIME_SUBTRACTION_MS", self.time_subtraction_ms)?;
        self.time_multiplications_ms = parse_override(
            &lookup,
            "TIME_MULTIPLICATIONS_MS",
            self.time_multiplications_ms,
        )?;
        self.time_divisions_ms =
            parse_override(&lookup, "TIME_DIVISIONS_MS", self.time_divisions_ms)?;
        self.shutdown_grace_secs =
            parse_override(&lookup, "SHUTDOWN_GRACE_SECS", self.shutdown_grace_secs)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("invalid orchestrator port: {}", self.port);
        }
        for (name, value) in [
            ("time_addition_ms", self.time_addition_ms),
            ("time_subtraction_ms", self.time_subtraction_ms),
            ("time_multiplications_ms", self.time_multiplications_ms),
            ("time_divisions_ms", self.time_divisions_ms),
        ] {
            if value == 0 {
                anyhow::bail!("invalid {name}: must be greater than zero");
            }
        }
        Ok(())
    }

    pub fn latency(&self) -> OperationLatency {
        OperationLatency {
            addition: Duration::from_millis(self.time_addition_ms),
            subtraction: Duration::from_millis(self.time_subtraction_ms),
            multiplication: Duration::from_millis(self.time_multiplications_ms),
            division: Duration::from_millis(self.time_divisions_ms),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn find_config_file(explicit: Option<String>) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn parse_override<T, F>(lookup: &F, key: &str, current: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        None => Ok(current),
    }
}
