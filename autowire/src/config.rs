//! Container configuration is created with opinionated default values, which can then be
//! overwritten by the `autowire.json` file and environment variables prefixed with `AUTOWIRE_`,
//! e.g. `AUTOWIRE_ROOT_NAMESPACE=app::services`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "AUTOWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "autowire.json";

/// Configuration of a [Container](crate::container::Container).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Namespace scanned by automatic discovery. Empty means all known types.
    pub root_namespace: String,
    /// Should the first bean access trigger discovery of the root namespace.
    pub discover_on_first_access: bool,
    /// Should a default tracing logger be installed when building the container.
    pub install_tracing_logger: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            root_namespace: String::new(),
            discover_on_first_access: false,
            install_tracing_logger: true,
        }
    }
}

impl From<OptionalContainerConfig> for ContainerConfig {
    fn from(value: OptionalContainerConfig) -> Self {
        let default = Self::default();
        Self {
            root_namespace: value.root_namespace.unwrap_or(default.root_namespace),
            discover_on_first_access: value
                .discover_on_first_access
                .unwrap_or(default.discover_on_first_access),
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
        }
    }
}

impl ContainerConfig {
    /// Loads the config from the default file and the environment.
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::from_file(CONFIG_FILE)
    }

    /// Loads the config from given optional file and the environment, which takes precedence.
    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalContainerConfig>())
            .map(|config| config.into())
    }

    pub fn with_root_namespace(mut self, root_namespace: impl Into<String>) -> Self {
        self.root_namespace = root_namespace.into();
        self
    }

    pub fn with_discover_on_first_access(mut self, discover_on_first_access: bool) -> Self {
        self.discover_on_first_access = discover_on_first_access;
        self
    }

    pub fn with_install_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }
}

#[derive(Deserialize, Default)]
struct OptionalContainerConfig {
    root_namespace: Option<String>,
    discover_on_first_access: Option<bool>,
    install_tracing_logger: Option<bool>,
}
