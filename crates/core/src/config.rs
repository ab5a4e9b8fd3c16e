use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

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

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub recalculation: RecalculationConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `KINETIX_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("KINETIX_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
            recalculation: RecalculationConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:          dir={}, watch={}", self.rules.dir.display(), self.rules.watch);
        tracing::info!(
            "  recalculation:  threads={}, on_error={}",
            self.recalculation.threads,
            self.recalculation.on_error
        );
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Directory holding YAML rule/selector definition documents.
    pub dir: PathBuf,
    /// Hot-reload definitions when files change.
    pub watch: bool,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
            watch: profiled_env_bool(p, "RULES_WATCH", false),
        }
    }
}

// ── Recalculation ─────────────────────────────────────────────

/// What a batch recalculation does when one workflow fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the batch and return the first error.
    Abort,
    /// Log the failure, record the workflow id and keep going.
    Skip,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Abort => write!(f, "abort"),
            ErrorPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            other => Err(format!("unknown error policy: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculationConfig {
    /// Worker threads for batch recalculation (0 = rayon default).
    pub threads: usize,
    pub on_error: ErrorPolicy,
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            on_error: ErrorPolicy::Skip,
        }
    }
}

impl RecalculationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let on_error = profiled_env_opt(p, "RECALC_ERROR_POLICY")
            .and_then(|v| match v.parse() {
                Ok(policy) => Some(policy),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring RECALC_ERROR_POLICY, using skip");
                    None
                }
            })
            .unwrap_or(ErrorPolicy::Skip);
        Self {
            threads: profiled_env_usize(p, "RECALC_THREADS", 0),
            on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_policy_parses_case_insensitively() {
        assert_eq!("ABORT".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Abort));
        assert_eq!("skip".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Skip));
        assert!("retry".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn profile_label_defaults() {
        let config = Config {
            profile: String::new(),
            rules: RulesConfig {
                dir: PathBuf::from("data/rules"),
                watch: false,
            },
            recalculation: RecalculationConfig::default(),
        };
        assert_eq!(config.profile_label(), "default");
    }

    #[test]
    fn profiled_key_wins_over_plain_key() {
        env::set_var("KXTEST_RULES_DIR", "/profiled/rules");
        assert_eq!(
            profiled_env_or("KXTEST", "RULES_DIR", "data/rules"),
            "/profiled/rules"
        );
        env::remove_var("KXTEST_RULES_DIR");
    }
}
