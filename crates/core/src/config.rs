use std::env;
use std::path::PathBuf;

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

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub node: NodeConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `IMPLIED_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("IMPLIED_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
            node: NodeConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:  file={}", self.rules.rules_file.display());
        tracing::info!("  node:   self_label={}", self.node.self_label);
    }

    /// Summary as JSON, used by the CLI `config` command.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "rules": { "file": self.rules.rules_file },
            "node": { "self_label": self.node.self_label },
        })
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// YAML file holding the persisted implications.
    pub rules_file: PathBuf,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_file: PathBuf::from(profiled_env_or(p, "IMPLIED_RULES_FILE", "data/implications.yml")),
        }
    }
}

// ── Node ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name used when a command does not name one.
    pub self_label: String,
}

impl NodeConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            self_label: profiled_env_or(p, "IMPLIED_SELF_LABEL", "built-in"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-wide: this profile name is unique to this test.
    #[test]
    fn profiled_key_wins_over_plain_key() {
        env::set_var("CFGTEST_IMPLIED_RULES_FILE", "/tmp/profiled.yml");
        env::set_var("CFGTEST_IMPLIED_SELF_LABEL", "controller");

        let config = Config::for_profile("cfgtest");
        assert_eq!(config.profile_label(), "CFGTEST");
        assert_eq!(config.rules.rules_file, PathBuf::from("/tmp/profiled.yml"));
        assert_eq!(config.node.self_label, "controller");

        env::remove_var("CFGTEST_IMPLIED_RULES_FILE");
        env::remove_var("CFGTEST_IMPLIED_SELF_LABEL");
    }

    #[test]
    fn summary_names_profile() {
        let config = Config::for_profile("");
        let summary = config.summary();
        assert_eq!(summary["profile"], "default");
        assert!(summary["rules"]["file"].is_string());
    }
}
