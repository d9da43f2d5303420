//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `STKPOLL__*` environment variables. The binary applies its own flag
//! overrides on top.

use crate::application::poller::PollerSettings;
use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "stkpoll";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Backend API root, e.g. `https://backend.example.com/api`.
    pub api_base_url: String,
    /// Bearer token attached to every backend request.
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub countdown_secs: u32,
    pub success_delay_secs: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_token: None,
            request_timeout_secs: 15,
            poll_interval_secs: 3,
            countdown_secs: crate::domain::session::DEFAULT_COUNTDOWN_SECS,
            success_delay_secs: 3,
        }
    }
}

impl CheckoutConfig {
    /// Loads and validates the configuration.
    ///
    /// An explicit `path` must exist; otherwise `stkpoll.toml` is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("STKPOLL").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_base_url).map_err(|e| {
            CheckoutError::Config(format!("invalid api_base_url {:?}: {e}", self.api_base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CheckoutError::Config(format!(
                "api_base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CheckoutError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(CheckoutError::Config(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.countdown_secs == 0 {
            return Err(CheckoutError::Config(
                "countdown_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            countdown_secs: self.countdown_secs,
            success_delay: Duration::from_secs(self.success_delay_secs),
        }
    }
}
