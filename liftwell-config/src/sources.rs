use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::{non_empty, parse_csv};

/// Raw configuration as defined in a TOML file.
///
/// ```toml
/// log_filter = "liftwell=debug,info"
/// buildings = ["e16e32e7-8db0-4536-b86e-f53e53cd7a0d"]
///
/// [store]
/// kind = "postgres"
/// url = "postgres://liftwell@localhost/liftwell"
///
/// [simulation]
/// tick_interval = "500ms"
/// ```
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub store: FileStoreConfig,
    #[serde(default)]
    pub registry: FileRegistryConfig,
    #[serde(default)]
    pub simulation: FileSimulationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileStoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

/// Durations are humantime strings such as `"90s"` or `"5m"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileRegistryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staleness_interval: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileSimulationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_backoff: Option<String>,
}

/// Configuration values read from the process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub store: Option<String>,
    pub database_url: Option<String>,
    pub max_connections: Option<String>,
    pub staleness_interval: Option<String>,
    pub tick_interval: Option<String>,
    pub failure_backoff: Option<String>,
    pub buildings: Option<Vec<String>>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).and_then(non_empty);
        Self {
            config_path: var("LIFTWELL_CONFIG").map(PathBuf::from),
            store: var("LIFTWELL_STORE"),
            database_url: var("LIFTWELL_DATABASE_URL").or_else(|| var("DATABASE_URL")),
            max_connections: var("LIFTWELL_DATABASE_MAX_CONNECTIONS"),
            staleness_interval: var("LIFTWELL_STALENESS_INTERVAL"),
            tick_interval: var("LIFTWELL_TICK_INTERVAL"),
            failure_backoff: var("LIFTWELL_FAILURE_BACKOFF"),
            buildings: var("LIFTWELL_BUILDINGS").map(|raw| parse_csv(&raw)),
            log_filter: var("LIFTWELL_LOG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn blank_variables_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LIFTWELL_STORE", "  "),
            ("DATABASE_URL", "postgres://fallback"),
            ("LIFTWELL_BUILDINGS", "a, ,b"),
        ]);
        let env = EnvConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(env.store, None);
        assert_eq!(env.database_url.as_deref(), Some("postgres://fallback"));
        assert_eq!(env.buildings, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
