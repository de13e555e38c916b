//! Runtime configuration

use std::env;

use serde::Deserialize;
use thiserror::Error;

use crate::{MaxSpeedPolicy, SpeedSession, DEFAULT_WINDOW_SIZE};

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const WEBAPP_URL_VAR: &str = "WEBAPP_URL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be provided!")]
    Missing(&'static str),
}

/// Bot settings taken from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    /// Mini app address, empty when not configured
    pub webapp_url: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing(TOKEN_VAR))?;

        let webapp_url = lookup(WEBAPP_URL_VAR).unwrap_or_default();

        Ok(Self { token, webapp_url })
    }
}

// The token must never reach the logs
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"***")
            .field("webapp_url", &self.webapp_url)
            .finish()
    }
}

/// Speed session settings
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    /// Samples kept for the live statistics
    pub window_size: usize,
    pub max_speed: MaxSpeedPolicy,
}

impl TrackerOptions {
    pub fn session(&self) -> SpeedSession {
        SpeedSession::new(self.window_size, self.max_speed)
    }
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_speed: MaxSpeedPolicy::ResetOnStart,
        }
    }
}

/// Bot polling settings
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotOptions {
    /// Long polling timeout of each updates request
    pub poll_timeout_secs: u64,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 10,
        }
    }
}
