//! Floor service configuration.
//!
//! Configuration is loaded from environment variables. Malformed values are
//! rejected at startup rather than silently replaced by defaults.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use common::types::ParticipantId;
use thiserror::Error;

use crate::broadcast::DEFAULT_EVENT_BUFFER;
use crate::floor::{FloorSettings, RequirementDefaults, VoteRequirement};

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Header carrying the identity resolved by the auth collaborator.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-participant";

/// Default number of concurrently active queue items.
pub const DEFAULT_MAX_ACTIVE_ITEMS: usize = 1;

/// Default floor instance ID prefix.
pub const DEFAULT_FLOOR_ID_PREFIX: &str = "floor";

/// Default request timeout for command endpoints.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity registered as president at startup.
    pub president_id: ParticipantId,

    /// Request header holding the authenticated participant id.
    pub identity_header: String,

    /// Concurrently active queue items (default: 1).
    pub max_active_items: usize,

    /// Idle timeout for pending speaker requests and objections.
    /// Disabled when unset.
    pub pending_timeout: Option<Duration>,

    /// Events buffered per observer before it must resync.
    pub event_buffer: usize,

    /// Vote requirement applied per proposal category when none is given.
    pub requirements: RequirementDefaults,

    /// Request timeout for HTTP handlers.
    pub request_timeout: Duration,

    /// Unique identifier for this floor instance.
    pub floor_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

fn parse_number<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("{key} must be a non-negative integer, got {raw}"))
            })
        })
        .transpose()
}

fn parse_rule(
    vars: &HashMap<String, String>,
    key: &str,
    default: VoteRequirement,
) -> Result<VoteRequirement, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let president_id = vars
            .get("FLOOR_PRESIDENT_ID")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(ParticipantId::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("FLOOR_PRESIDENT_ID".to_string()))?;

        let bind_address = vars
            .get("FLOOR_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let identity_header = vars
            .get("FLOOR_IDENTITY_HEADER")
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_string());
        if axum::http::HeaderName::from_bytes(identity_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "FLOOR_IDENTITY_HEADER is not a valid header name: {identity_header}"
            )));
        }

        let max_active_items =
            parse_number(vars, "FLOOR_MAX_ACTIVE_ITEMS")?.unwrap_or(DEFAULT_MAX_ACTIVE_ITEMS);
        if max_active_items == 0 {
            return Err(ConfigError::InvalidValue(
                "FLOOR_MAX_ACTIVE_ITEMS must be at least 1".to_string(),
            ));
        }

        let pending_timeout = match parse_number::<u64>(vars, "FLOOR_PENDING_TIMEOUT_SECONDS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue(
                    "FLOOR_PENDING_TIMEOUT_SECONDS must be positive".to_string(),
                ))
            }
            other => other.map(Duration::from_secs),
        };

        let event_buffer = parse_number(vars, "FLOOR_EVENT_BUFFER")?.unwrap_or(DEFAULT_EVENT_BUFFER);
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "FLOOR_EVENT_BUFFER must be at least 1".to_string(),
            ));
        }

        let request_timeout = Duration::from_secs(
            parse_number(vars, "FLOOR_REQUEST_TIMEOUT_SECONDS")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        );

        let defaults = RequirementDefaults::default();
        let requirements = RequirementDefaults {
            normal: parse_rule(vars, "FLOOR_NORMAL_RULE", defaults.normal)?,
            priority: parse_rule(vars, "FLOOR_PRIORITY_RULE", defaults.priority)?,
            constitutional: parse_rule(vars, "FLOOR_CONSTITUTIONAL_RULE", defaults.constitutional)?,
        };

        let floor_id = vars.get("FLOOR_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_FLOOR_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            bind_address,
            president_id,
            identity_header,
            max_active_items,
            pending_timeout,
            event_buffer,
            requirements,
            request_timeout,
            floor_id,
        })
    }

    /// Settings for the floor state machine.
    #[must_use]
    pub fn floor_settings(&self) -> FloorSettings {
        FloorSettings {
            president: self.president_id.clone(),
            max_active_items: self.max_active_items,
            requirements: self.requirements,
        }
    }
}
