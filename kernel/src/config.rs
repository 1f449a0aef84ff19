//! `KernelConfig`: the kernel's own configuration shape,
//! deserialized from TOML with environment-variable overrides applied
//! on top. Mirrors the layered-override pattern the reference
//! implementation uses for per-request operator overrides: a static
//! base plus punctual overrides, never silently merged.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors loading a [`KernelConfig`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML body could not be parsed.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage paths the kernel's stores are opened against.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct StoragePaths {
    /// RAG document store database file.
    pub rag_db: String,
    /// Session memory root directory.
    pub session_root: String,
    /// Timeline database file. May colocate with `rag_db`.
    #[serde(default = "StoragePaths::default_timeline_db")]
    pub timeline_db: String,
}

impl StoragePaths {
    fn default_timeline_db() -> String {
        "timeline.sqlite3".to_string()
    }
}

/// The kernel's own configuration: tool base URLs, storage
/// paths, and the HTTP bind address.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct KernelConfig {
    /// `tool name -> base URL` for every Tool-Client to register.
    /// A catalog tool with no entry here is simply not registered;
    /// `/health` reports it absent rather than failing boot.
    pub tool_base_urls: BTreeMap<String, String>,
    /// Where the kernel's own stores live on disk.
    pub storage: StoragePaths,
    /// The address the HTTP server binds to, e.g. `"127.0.0.1:8080"`.
    #[serde(default = "KernelConfig::default_bind_address")]
    pub bind_address: String,
    /// How often `run_autonomous_cycle` fires for each known session, in seconds.
    #[serde(default = "KernelConfig::default_autonomous_cycle_interval_secs")]
    pub autonomous_cycle_interval_secs: u64,
}

impl KernelConfig {
    fn default_bind_address() -> String {
        "127.0.0.1:8080".to_string()
    }

    fn default_autonomous_cycle_interval_secs() -> u64 {
        300
    }

    /// Parse a TOML document, then apply `KERNEL_<SECTION>_<KEY>`
    /// environment-variable overrides on top. Pure and testable — no
    /// filesystem access.
    pub fn from_str(toml_body: &str, env: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut config: KernelConfig = toml::from_str(toml_body)?;
        config.apply_env_overrides(env);
        Ok(config)
    }

    fn apply_env_overrides(&mut self, env: &BTreeMap<String, String>) {
        if let Some(v) = env.get("KERNEL_HTTP_BIND_ADDRESS") {
            self.bind_address = v.clone();
        }
        if let Some(v) = env.get("KERNEL_STORAGE_RAG_DB") {
            self.storage.rag_db = v.clone();
        }
        if let Some(v) = env.get("KERNEL_STORAGE_SESSION_ROOT") {
            self.storage.session_root = v.clone();
        }
        if let Some(v) = env.get("KERNEL_STORAGE_TIMELINE_DB") {
            self.storage.timeline_db = v.clone();
        }
        if let Some(v) = env.get("KERNEL_AUTONOMOUS_CYCLE_INTERVAL_SECS") {
            if let Ok(secs) = v.parse() {
                self.autonomous_cycle_interval_secs = secs;
            }
        }
        for (key, value) in env {
            if let Some(tool) = key.strip_prefix("KERNEL_TOOL_URL_") {
                self.tool_base_urls.insert(tool.to_ascii_lowercase(), value.clone());
            }
        }
    }

    /// Read and parse a config file from `path`, applying the current
    /// process environment's overrides. The thin, non-pure wrapper
    /// `main` calls; `from_str` is what tests exercise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path)?;
        let env: BTreeMap<String, String> = std::env::vars().collect();
        Self::from_str(&body, &env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        bind_address = "127.0.0.1:9000"

        [tool_base_urls]
        files = "http://127.0.0.1:9101"
        llm = "http://127.0.0.1:9102"

        [storage]
        rag_db = "rag.sqlite3"
        session_root = "sessions"
    "#;

    #[test]
    fn parses_without_env_overrides() {
        let config = KernelConfig::from_str(SAMPLE, &BTreeMap::new()).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.tool_base_urls["files"], "http://127.0.0.1:9101");
        assert_eq!(config.storage.timeline_db, "timeline.sqlite3");
    }

    #[test]
    fn env_override_replaces_bind_address() {
        let mut env = BTreeMap::new();
        env.insert("KERNEL_HTTP_BIND_ADDRESS".to_string(), "0.0.0.0:8080".to_string());
        let config = KernelConfig::from_str(SAMPLE, &env).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn env_override_adds_a_tool_url() {
        let mut env = BTreeMap::new();
        env.insert("KERNEL_TOOL_URL_VISION".to_string(), "http://127.0.0.1:9200".to_string());
        let config = KernelConfig::from_str(SAMPLE, &env).unwrap();
        assert_eq!(config.tool_base_urls["vision"], "http://127.0.0.1:9200");
        assert_eq!(config.tool_base_urls["files"], "http://127.0.0.1:9101");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(KernelConfig::from_str("not valid toml {{{", &BTreeMap::new()).is_err());
    }
}
