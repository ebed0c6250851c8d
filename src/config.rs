use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PROGRESS_BACKEND must be 'local' or 'remote', got '{0}'")]
    UnknownBackend(String),
    #[error("{0} must be set for the remote backend")]
    MissingVar(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    InvalidVar { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub access_token: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub data_path: PathBuf,
    pub curriculum_path: PathBuf,
    pub store_timeout: Duration,
    pub remote: Option<RemoteSettings>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar { name: "PORT", value })?,
            None => 8080,
        };

        let backend = match var("PROGRESS_BACKEND").as_deref().map(str::trim) {
            None | Some("local") => Backend::Local,
            Some("remote") => Backend::Remote,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let store_timeout = match var("STORE_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidVar {
                    name: "STORE_TIMEOUT_SECS",
                    value,
                })?,
            None => Duration::from_secs(10),
        };

        let remote = match backend {
            Backend::Local => None,
            Backend::Remote => Some(RemoteSettings {
                url: var("SUPABASE_URL").ok_or(ConfigError::MissingVar("SUPABASE_URL"))?,
                anon_key: var("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::MissingVar("SUPABASE_ANON_KEY"))?,
                table: var("PROGRESS_TABLE").unwrap_or_else(|| "progress".into()),
                access_token: var("PROGRESS_ACCESS_TOKEN"),
                redirect_url: var("AUTH_REDIRECT_URL"),
            }),
        };

        Ok(Self {
            port,
            backend,
            data_path: var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/progress.json")),
            curriculum_path: var("CURRICULUM_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/days.json")),
            store_timeout,
            remote,
        })
    }
}
