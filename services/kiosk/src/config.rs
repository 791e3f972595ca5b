//! Kiosk configuration

use std::time::Duration;

use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;
use uuid::Uuid;

/// Kiosk settings
///
/// Read from `KIOSK_*` environment variables:
/// - `KIOSK_API_URL` (default: `http://localhost:3001`)
/// - `KIOSK_ORGANIZATION_ID`, `KIOSK_SESSION_ID`: required
/// - `KIOSK_CODE_LENGTH`: overrides the organization's code length
/// - `KIOSK_DEBOUNCE_MS` (default: 50)
/// - `KIOSK_REQUEST_TIMEOUT_MS` (default: 5000)
/// - `KIOSK_PROBE_SCHEDULE`: cron with seconds (default: every 5 seconds)
#[derive(Debug, Clone, Deserialize)]
pub struct KioskConfig {
    pub api_url: String,
    pub organization_id: Uuid,
    pub session_id: Uuid,
    #[serde(default)]
    pub code_length: Option<usize>,
    pub debounce_ms: u64,
    pub request_timeout_ms: u64,
    pub probe_schedule: String,
}

impl KioskConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("api_url", "http://localhost:3001")?
            .set_default("debounce_ms", 50)?
            .set_default("request_timeout_ms", 5000)?
            .set_default("probe_schedule", "0/5 * * * * *")?
            .add_source(Environment::with_prefix("KIOSK").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
