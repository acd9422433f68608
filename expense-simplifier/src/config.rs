//! Configuration for the expense simplifier

use crate::types::EdgeOrdering;
use serde::{Deserialize, Serialize};

/// Simplifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifierConfig {
    /// Service name (log context)
    pub service_name: String,

    /// Order in which debt edges are resolved
    pub edge_ordering: EdgeOrdering,

    /// Check every user's net balance after each run
    pub verify_conservation: bool,

    /// Record Prometheus metrics
    pub metrics_enabled: bool,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            service_name: "expense-simplifier".to_string(),
            edge_ordering: EdgeOrdering::Priority,
            verify_conservation: true,
            metrics_enabled: true,
        }
    }
}

impl SimplifierConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SimplifierConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` on top of the defaults
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = SimplifierConfig::default();

        if let Some(name) = lookup("SIMPLIFIER_SERVICE_NAME") {
            config.service_name = name;
        }

        if let Some(ordering) = lookup("SIMPLIFIER_EDGE_ORDERING") {
            config.edge_ordering = ordering.parse()?;
        }

        if let Some(verify) = lookup("SIMPLIFIER_VERIFY_CONSERVATION") {
            config.verify_conservation = parse_bool("SIMPLIFIER_VERIFY_CONSERVATION", &verify)?;
        }

        if let Some(enabled) = lookup("SIMPLIFIER_METRICS_ENABLED") {
            config.metrics_enabled = parse_bool("SIMPLIFIER_METRICS_ENABLED", &enabled)?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> crate::Result<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::Error::Config(format!("{} must be true or false, got {}", key, value)))
}
