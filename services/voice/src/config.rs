//! Application Configuration Module
//!
//! Centralizes the runtime's configuration: everything is loaded from
//! environment variables (with a `.env` file honored for local development)
//! into a single struct passed through the application.

use sci_core::controller::ControllerConfig;
use sci_core::feedback::FeedbackTiming;
use sci_core::session::SessionTiming;
use sci_core::transcript::TranscriptTiming;
use std::env;
use std::time::Duration;
use tracing::Level;

/// Channel capacity for runtime commands coming out of the controller.
pub const COMMAND_CAPACITY: usize = 256;
/// Channel capacity for the room client's event fan-out.
pub const ROOM_EVENT_CAPACITY: usize = 1024;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend serving the dispatch/token/feedback API.
    pub backend_base_url: String,
    /// Overrides the room websocket URL the token endpoint hands out.
    /// Useful when the backend advertises an address the client can't reach.
    pub room_url_override: Option<String>,
    pub log_level: Level,
    pub controller: ControllerConfig,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid millisecond value for {0}: {1}")]
    InvalidDelay(&'static str, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `BACKEND_BASE_URL`: (Optional) Backend API base. Defaults to "http://127.0.0.1:8000".
    // *   `ROOM_WS_URL`: (Optional) Overrides the room websocket URL from the token response.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    // *   `USER_FINALIZE_MS` / `ASSISTANT_FINALIZE_MS`: (Optional) Transcript finalize delays.
    // *   `DISPATCH_RETRY_MS`: (Optional) Pause before the single dispatch retry.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Ignored if not present.
        dotenvy::dotenv().ok();

        let backend_base_url =
            env::var("BACKEND_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let room_url_override = env::var("ROOM_WS_URL").ok().filter(|url| !url.is_empty());

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        let transcript_defaults = TranscriptTiming::default();
        let session_defaults = SessionTiming::default();
        let transcript = TranscriptTiming {
            user_finalize: delay_var("USER_FINALIZE_MS", transcript_defaults.user_finalize)?,
            assistant_finalize: delay_var(
                "ASSISTANT_FINALIZE_MS",
                transcript_defaults.assistant_finalize,
            )?,
        };
        let session = SessionTiming {
            dispatch_retry_delay: delay_var(
                "DISPATCH_RETRY_MS",
                session_defaults.dispatch_retry_delay,
            )?,
            ..session_defaults
        };

        Ok(Self {
            backend_base_url,
            room_url_override,
            log_level,
            controller: ControllerConfig {
                transcript,
                session,
                feedback: FeedbackTiming::default(),
            },
        })
    }
}

fn delay_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDelay(name, value)),
        Err(_) => Ok(default),
    }
}
