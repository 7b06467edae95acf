use std::{env, fmt};

use serde::{Deserialize, Serialize};

/// Name of the variable that selects the `config/app-{env}.toml` overlay.
pub const FORERUN_ENV: &str = "FORERUN_ENV";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Environment {
    #[serde(rename = "prod")]
    Prod,

    #[serde(rename = "dev")]
    Dev,

    #[serde(rename = "test")]
    Test,

    #[serde(untagged)]
    Custom(Box<str>),
}

impl Environment {
    pub fn resolve_from_env() -> Self {
        Self::resolve(env::var(FORERUN_ENV).ok())
    }

    /// Falls back to `Dev` for debug builds and `Prod` otherwise when `value`
    /// is absent.
    pub fn resolve(value: Option<String>) -> Self {
        match value {
            Some(e) => Self::from(e),
            None if cfg!(debug_assertions) => Environment::Dev,
            None => Environment::Prod,
        }
    }

    pub fn overlay_file(&self) -> String {
        format!("app-{}.toml", self)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Prod => write!(f, "prod"),
            Environment::Dev => write!(f, "dev"),
            Environment::Test => write!(f, "test"),
            Environment::Custom(c) => c.fmt(f),
        }
    }
}

impl From<Box<str>> for Environment {
    fn from(s: Box<str>) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Environment::Prod,
            "dev" | "development" => Environment::Dev,
            "test" => Environment::Test,
            _ => Environment::Custom(s),
        }
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        s.into_boxed_str().into()
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Box::<str>::from(s).into()
    }
}
