use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const ENV_DB: &str = "RAIRE_DB";
pub const ENV_LOG: &str = "RAIRE_LOG";
pub const ENV_RISK_LIMIT: &str = "RAIRE_RISK_LIMIT";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Used by exports when the request does not carry a risk limit.
    pub default_risk_limit: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".raire/raire.db"),
            log_level: "info".to_string(),
            default_risk_limit: 0.03,
        }
    }
}

/// A loaded config plus the keys the file carried that we do not know.
/// Logging is usually not up yet when config loads, so callers report these.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub ignored_keys: Vec<String>,
}

impl ServiceConfig {
    /// Defaults, then the YAML file if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<LoadedConfig> {
        let (mut config, ignored_keys) = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config {}", p.display()))?;
                Self::from_yaml_str(&raw)
                    .with_context(|| format!("failed to parse config {}", p.display()))?
            }
            None => (Self::default(), Vec::new()),
        };
        config.apply_overrides(|k| env::var(k).ok());
        config.validate()?;
        Ok(LoadedConfig {
            config,
            ignored_keys,
        })
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = serde_yaml::Deserializer::from_str(raw);
        let cfg: ServiceConfig = serde_ignored::deserialize(deserializer, |path| {
            ignored.push(path.to_string());
        })?;
        ignored.sort();
        Ok((cfg, ignored))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_DB) {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_LOG) {
            self.log_level = v;
        }
        if let Some(v) = lookup(ENV_RISK_LIMIT) {
            if let Ok(n) = v.parse() {
                self.default_risk_limit = n;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.default_risk_limit.is_finite() || self.default_risk_limit < 0.0 {
            anyhow::bail!(
                "default_risk_limit must be a non-negative number, got {}",
                self.default_risk_limit
            );
        }
        Ok(())
    }
}
