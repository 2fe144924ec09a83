use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, net::SocketAddr, path::Path, path::PathBuf, time::Duration};

use crate::sync::poller::DEFAULT_POLL_INTERVAL;

pub const CONFIG_PATH_VAR: &str = "STREAMTIMER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub bind_addr: String,
    pub db_path: PathBuf,
    /// Origin used when building control and view links; falls back to the
    /// bind address.
    pub public_url: Option<String>,
    pub poll_interval_ms: u64,
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".into(),
            db_path: PathBuf::from("streamtimer.sqlite3"),
            public_url: None,
            poll_interval_ms: u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(u64::MAX),
            cors_origins: vec!["*".into()],
        }
    }
}

impl ServerSettings {
    /// Settings from the file named by `STREAMTIMER_CONFIG` (if any), then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(
                "Ignoring unparsable settings in {}: {err}; using defaults",
                path.display()
            );
            Self::default()
        }))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("STREAMTIMER_BIND") {
            self.bind_addr = bind;
        }
        if let Some(db) = lookup("STREAMTIMER_DB") {
            self.db_path = PathBuf::from(db);
        }
        if let Some(url) = lookup("STREAMTIMER_PUBLIC_URL") {
            self.public_url = Some(url);
        }
        if let Some(origins) = lookup("STREAMTIMER_CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Origin for view and control links. Without an explicit public URL a
    /// wildcard bind (`0.0.0.0`, `[::]`) is advertised as `localhost`, since
    /// browser sources cannot load the unspecified address.
    pub fn public_base_url(&self) -> String {
        if let Some(url) = &self.public_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.bind_addr.parse::<SocketAddr>() {
            Ok(addr) if addr.ip().is_unspecified() => format!("http://localhost:{}", addr.port()),
            _ => format!("http://{}", self.bind_addr),
        }
    }
}
