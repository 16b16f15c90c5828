use std::fs;
use std::path::{Path, PathBuf};

use liftwell_core::{RegistryConfig, SimulationConfig};
use liftwell_model::BuildingID;

use crate::models::{
    Config, ConfigMetadata, DEFAULT_LOG_FILTER, DEFAULT_MAX_CONNECTIONS, StoreConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::util::parse_duration;
use crate::validation::ConfigWarnings;

pub mod error;

use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["liftwell.toml", "config/liftwell.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Use these variables instead of the process environment. No `.env`
    /// file is read when set.
    pub env_override: Option<EnvConfig>,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env_override = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file_loaded) = match &self.options.env_override {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) =
            compose_config(file_config, env, config_path, env_file_loaded)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match result {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let requested = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match requested {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();
    if file_config.is_none() {
        warnings.add(
            "No liftwell.toml found; using defaults and environment variables",
            "Pass --config or set LIFTWELL_CONFIG to use a configuration file",
        );
    }

    let FileConfig {
        store: file_store,
        registry: file_registry,
        simulation: file_simulation,
        buildings: file_buildings,
        log_filter: file_log_filter,
    } = file_config.unwrap_or_default();

    let store = resolve_store(&env, file_store, &mut warnings)?;

    let mut registry = RegistryConfig::default();
    if let Some(raw) = env.staleness_interval.or(file_registry.staleness_interval) {
        registry.staleness_interval = parse_duration("registry.staleness_interval", &raw)?;
    }

    let mut simulation = SimulationConfig::default();
    if let Some(raw) = env.tick_interval.or(file_simulation.tick_interval) {
        simulation.tick_interval = parse_duration("simulation.tick_interval", &raw)?;
    }
    if let Some(raw) = env.failure_backoff.or(file_simulation.failure_backoff) {
        simulation.failure_backoff = parse_duration("simulation.failure_backoff", &raw)?;
    }

    let buildings = env
        .buildings
        .or(file_buildings)
        .unwrap_or_default()
        .iter()
        .map(|raw| {
            raw.trim()
                .parse::<BuildingID>()
                .map_err(|err| ConfigLoadError::InvalidValue {
                    key: "buildings".to_string(),
                    value: raw.clone(),
                    reason: err.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let log_filter = env
        .log_filter
        .or(file_log_filter)
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let config = Config {
        store,
        registry,
        simulation,
        buildings,
        log_filter,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };
    Ok((config, warnings))
}

fn resolve_store(
    env: &EnvConfig,
    file_store: crate::sources::FileStoreConfig,
    warnings: &mut ConfigWarnings,
) -> Result<StoreConfig, ConfigLoadError> {
    let kind = env
        .store
        .clone()
        .or(file_store.kind)
        .unwrap_or_else(|| "memory".to_string());
    let url = env.database_url.clone().or(file_store.url);

    match kind.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            if url.is_some() {
                warnings.add(
                    "A database URL is configured but the memory store is selected",
                    "Set store.kind = \"postgres\" or LIFTWELL_STORE=postgres to use it",
                );
            }
            Ok(StoreConfig::Memory)
        }
        "postgres" | "postgresql" => {
            let url = url.ok_or_else(|| ConfigLoadError::InvalidValue {
                key: "store.url".to_string(),
                value: String::new(),
                reason: "the postgres store needs a database URL".to_string(),
            })?;
            let max_connections = match &env.max_connections {
                Some(raw) => raw.trim().parse::<u32>().map_err(|err| {
                    ConfigLoadError::InvalidValue {
                        key: "store.max_connections".to_string(),
                        value: raw.clone(),
                        reason: err.to_string(),
                    }
                })?,
                None => file_store.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
            };
            if max_connections == 0 {
                return Err(ConfigLoadError::InvalidValue {
                    key: "store.max_connections".to_string(),
                    value: "0".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            Ok(StoreConfig::Postgres {
                url,
                max_connections,
            })
        }
        _ => Err(ConfigLoadError::InvalidValue {
            key: "store.kind".to_string(),
            value: kind,
            reason: "expected \"memory\" or \"postgres\"".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_apply_without_any_source() {
        let (config, warnings) =
            compose_config(None, EnvConfig::default(), None, false).unwrap();

        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.registry.staleness_interval, Duration::from_secs(300));
        assert_eq!(config.simulation.tick_interval, Duration::from_secs(1));
        assert_eq!(config.simulation.failure_backoff, Duration::from_secs(5));
        assert!(config.buildings.is_empty());
        assert_eq!(config.log_filter, "info");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn unknown_store_kind_is_rejected() {
        let env = EnvConfig {
            store: Some("redis".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, None, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidValue { ref key, .. } if key == "store.kind"
        ));
    }

    #[test]
    fn postgres_requires_a_url() {
        let env = EnvConfig {
            store: Some("postgres".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, None, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidValue { ref key, .. } if key == "store.url"
        ));
    }
}
