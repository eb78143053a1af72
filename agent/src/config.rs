use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const CONFIG_ENV: &str = "AGENT_CONFIG";
const SEARCH_PATHS: &[&str] = &[
    "./configs/agent.toml",
    "./agent.toml",
    "/etc/calcflow/agent.toml",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the orchestrator, without a trailing path
    pub orchestrator_url: String,
    /// Number of concurrent pollers
    pub computing_power: usize,
    /// Pause after "no work" or a failed request
    pub poll_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8080".to_string(),
            computing_power: 5,
            poll_backoff_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    agent: AgentConfig,
}

impl AgentConfig {
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
        Ok(file.agent)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ORCHESTRATOR_URL") {
            self.orchestrator_url = url.trim().to_string();
        }
        self.computing_power = parse_override(&lookup, "COMPUTING_POWER", self.computing_power)?;
        self.poll_backoff_ms = parse_override(&lookup, "POLL_BACKOFF_MS", self.poll_backoff_ms)?;
        self.request_timeout_secs =
            parse_override(&lookup, "REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.orchestrator_url.trim().is_empty() {
            anyhow::bail!("invalid orchestrator URL: must not be empty");
        }
        if self.computing_power == 0 {
            anyhow::bail!("invalid computing power: must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("invalid request timeout: must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_backoff(&self) -> Duration {
        Duration::from_millis(self.poll_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
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
