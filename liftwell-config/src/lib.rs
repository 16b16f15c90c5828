//! Configuration loading for liftwell.
//!
//! Values are layered in increasing precedence: built-in defaults, a TOML
//! file, then environment variables (after an optional `.env` file has been
//! applied to the process environment).
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::{Config, ConfigMetadata, StoreConfig};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigWarning, ConfigWarnings};
