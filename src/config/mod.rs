//! Workbench configuration.
//!
//! Priority (highest to lowest):
//!   1. CLI / env — passed as `Some(value)` from clap
//!   2. TOML file at `{data_dir}/config.toml`
//!   3. Built-in defaults

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_SERVICE_URL: &str = "https://builder.local:18443";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

fn default_data_dir() -> PathBuf {
    dirs_home()
        .map(|h| h.join(".svcbuilder"))
        .unwrap_or_else(|| PathBuf::from(".svcbuilder"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Builder service base URL (default: https://builder.local:18443).
    service_url: Option<String>,
    /// Default request timeout in milliseconds (default: 5000).
    timeout_ms: Option<u64>,
    /// Log level filter string, e.g. "debug", "info,svcbuilder=trace" (default: "info").
    log: Option<String>,
    /// Workfolder holding applications (default: current directory).
    workfolder: Option<PathBuf>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── WorkbenchConfig ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    /// Root directory open in the workbench, containing zero or more applications.
    pub workfolder: PathBuf,
    /// Workbench state directory: config.toml, secrets.json, devtime/ cache.
    pub data_dir: PathBuf,
    /// Builder service base URL used for register/connect before a workspace
    /// connection exists.
    pub service_url: String,
    /// Default request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Log level filter string.
    pub log: String,
}

impl WorkbenchConfig {
    /// Build config from CLI/env args + optional TOML file.
    pub fn new(
        workfolder: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        service_url: Option<String>,
        log: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let workfolder = workfolder
            .or(toml.workfolder)
            .unwrap_or_else(|| PathBuf::from("."));
        let service_url = service_url
            .or(toml.service_url)
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        let timeout_ms = toml.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        Self {
            workfolder,
            data_dir,
            service_url,
            timeout_ms,
            log,
        }
    }

    /// Root of the devtime cache (locally persisted remote snapshots).
    pub fn devtime_dir(&self) -> PathBuf {
        self.data_dir.join("devtime")
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
