pub mod group;
pub mod logger;
pub mod server;

use std::{
    env,
    path::{Path, PathBuf},
};

pub use config::ConfigError;
use config::{File, Map, Value, ValueKind};
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::environment::Environment;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "FORERUN";

/// Separates nested keys in environment variable names, so
/// `FORERUN_SERVER__REQUEST_BODY_LIMIT` sets `server.request_body_limit`.
pub const ENV_SEPARATOR: &str = "__";

/// Layered application settings.
///
/// Later layers override earlier ones:
///
/// 1. `{folder}/app.toml`
/// 2. `{folder}/app-{env}.toml`
/// 3. `FORERUN_`-prefixed environment variables
///
/// Every layer is optional.
#[derive(Clone)]
pub struct Config {
    inner: config::Config,
}

impl Config {
    pub fn new(config: config::Config) -> Self {
        Self { inner: config }
    }

    /// Loads from the `config` folder next to the crate manifest when run by
    /// cargo, or next to the executable otherwise.
    pub fn load(env: &Environment) -> Result<Self, ConfigError> {
        static DEFAULT_FOLDER: Lazy<PathBuf> = Lazy::new(|| {
            let base = env::var_os("CARGO_MANIFEST_DIR")
                .map(PathBuf::from)
                .or_else(|| {
                    env::current_exe()
                        .ok()
                        .and_then(|exe| exe.parent().map(Path::to_path_buf))
                })
                .unwrap_or_default();

            base.join("config")
        });

        Self::from_folder(env, &DEFAULT_FOLDER)
    }

    pub fn from_folder(env: &Environment, folder: &Path) -> Result<Self, ConfigError> {
        Self::layered(env, folder, None)
    }

    /// `vars` replaces the process environment when given.
    fn layered(
        env: &Environment,
        folder: &Path,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        for name in [String::from("app.toml"), env.overlay_file()] {
            let path = folder.join(name);

            if path.is_file() {
                tracing::info!("loading configuration from `{}`", path.display());
            } else {
                tracing::debug!("skipping missing `{}`", path.display());
            }

            builder = builder.add_source(File::from(path).required(false));
        }

        let overrides = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(vars);

        builder.add_source(overrides).build().map(Self::new)
    }

    /// Reads the `T::PREFIX` section. A missing section deserializes from an
    /// empty table, so sections whose fields all have defaults are optional.
    pub fn get<'de, T>(&self) -> Result<T, ConfigError>
    where
        T: ConfigPrefix + Deserialize<'de>,
    {
        match self.inner.get::<T>(T::PREFIX) {
            Err(ConfigError::NotFound(_)) => {
                T::deserialize(Value::new(None, ValueKind::Table(Map::new())))
            }
            section => section,
        }
    }
}

pub trait ConfigPrefix {
    const PREFIX: &'static str;
}

#[cfg(test)]
pub(crate) fn config_from_toml(toml: &str) -> Config {
    let inner = config::Config::builder()
        .add_source(File::from_str(toml, config::FileFormat::Toml))
        .build()
        .unwrap();

    Config::new(inner)
}
