use std::fmt;
use std::path::PathBuf;

use liftwell_core::{RegistryConfig, SimulationConfig};
use liftwell_model::BuildingID;

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub registry: RegistryConfig,
    pub simulation: SimulationConfig,
    /// Buildings to simulate. Empty means the demo building.
    pub buildings: Vec<BuildingID>,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub metadata: ConfigMetadata,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::Memory,
            registry: RegistryConfig::default(),
            simulation: SimulationConfig::default(),
            buildings: Vec::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            metadata: ConfigMetadata::default(),
        }
    }
}

/// Where elevator state is persisted.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local store seeded with the demo fleet.
    Memory,
    Postgres { url: String, max_connections: u32 },
}

impl StoreConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Postgres { .. } => "postgres",
        }
    }
}

// Database URLs usually carry credentials.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::Postgres {
                max_connections, ..
            } => f
                .debug_struct("Postgres")
                .field("url", &"<redacted>")
                .field("max_connections", max_connections)
                .finish(),
        }
    }
}

/// Provenance of the loaded configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_debug_hides_the_url() {
        let store = StoreConfig::Postgres {
            url: "postgres://lift:secret@db/liftwell".into(),
            max_connections: 3,
        };
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("max_connections: 3"));
    }
}
