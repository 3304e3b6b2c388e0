use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub operations: OperationTimes,
    pub agent: AgentConfig,
    pub watchdog: WatchdogConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CALC_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CALC_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            operations: OperationTimes::from_env_profiled(p),
            agent: AgentConfig::from_env_profiled(p),
            watchdog: WatchdogConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  operations:  +{}ms -{}ms *{}ms /{}ms u-{}ms",
            self.operations.addition_ms,
            self.operations.subtraction_ms,
            self.operations.multiplication_ms,
            self.operations.division_ms,
            self.operations.negation_ms
        );
        tracing::info!(
            "  agent:       url={}, workers={}, poll={}ms, backoff={}ms",
            self.agent.orchestrator_url,
            self.agent.computing_power,
            self.agent.poll_interval_ms,
            self.agent.dependency_backoff_ms
        );
        tracing::info!(
            "  watchdog:    stale_after={}s, every={}s",
            self.watchdog.stale_task_secs,
            self.watchdog.interval_secs
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8080),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Operation durations ───────────────────────────────────────

/// Expected duration of each operator, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationTimes {
    pub addition_ms: u64,
    pub subtraction_ms: u64,
    pub multiplication_ms: u64,
    pub division_ms: u64,
    pub negation_ms: u64,
}

impl Default for OperationTimes {
    fn default() -> Self {
        Self {
            addition_ms: 5,
            subtraction_ms: 5,
            multiplication_ms: 10,
            division_ms: 10,
            negation_ms: 5,
        }
    }
}

impl OperationTimes {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            addition_ms: profiled_env_parse(p, "TIME_ADDITION_MS", d.addition_ms),
            subtraction_ms: profiled_env_parse(p, "TIME_SUBTRACTION_MS", d.subtraction_ms),
            multiplication_ms: profiled_env_parse(p, "TIME_MULTIPLICATIONS_MS", d.multiplication_ms),
            division_ms: profiled_env_parse(p, "TIME_DIVISIONS_MS", d.division_ms),
            negation_ms: profiled_env_parse(p, "TIME_NEGATION_MS", d.negation_ms),
        }
    }

    /// All durations zero. Used by tests that don't care about timing.
    pub fn instant() -> Self {
        Self {
            addition_ms: 0,
            subtraction_ms: 0,
            multiplication_ms: 0,
            division_ms: 0,
            negation_ms: 0,
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub orchestrator_url: String,
    /// Number of concurrent workers.
    pub computing_power: usize,
    pub poll_interval_ms: u64,
    pub dependency_backoff_ms: u64,
    /// Sleep for each task's expected duration before computing it.
    pub simulate_duration: bool,
}

impl AgentConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            orchestrator_url: profiled_env_or(p, "ORCHESTRATOR_URL", "http://localhost:8080"),
            computing_power: profiled_env_parse::<usize>(p, "COMPUTING_POWER", 1).max(1),
            poll_interval_ms: profiled_env_parse(p, "AGENT_POLL_INTERVAL_MS", 500),
            dependency_backoff_ms: profiled_env_parse(p, "DEPENDENCY_BACKOFF_MS", 100),
            simulate_duration: profiled_env_bool(p, "AGENT_SIMULATE_DURATION", true),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dependency_backoff(&self) -> Duration {
        Duration::from_millis(self.dependency_backoff_ms)
    }
}

// ── Watchdog ──────────────────────────────────────────────────

/// Reports tasks that were dispatched but never answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    pub stale_task_secs: u64,
    pub interval_secs: u64,
}

impl WatchdogConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            stale_task_secs: profiled_env_parse(p, "STALE_TASK_SECS", 30),
            interval_secs: profiled_env_parse(p, "WATCHDOG_INTERVAL_SECS", 10),
        }
    }
}
