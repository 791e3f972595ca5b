//! Service configuration

use std::time::Duration;

use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 3000;

/// HTTP service settings
///
/// Read from `ATTENDANCE_API_*` environment variables:
/// - `ATTENDANCE_API_BIND_ADDRESS` (default: `0.0.0.0:3001`)
/// - `ATTENDANCE_API_STORE_TIMEOUT_MS`: deadline for each store call (default: 3000)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub store_timeout_ms: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("store_timeout_ms", DEFAULT_STORE_TIMEOUT_MS)?
            .add_source(Environment::with_prefix("ATTENDANCE_API").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.store_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "store_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
