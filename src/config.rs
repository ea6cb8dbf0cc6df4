//! Dispatcher configuration
//!
//! Constants plus the validated settings handed to the dispatch engine.

use crate::error::{AppError, AppResult};
use crate::notifier::Template;
use std::path::PathBuf;

/// PushPlus send endpoint
pub const PUSHPLUS_API: &str = "http://www.pushplus.plus/send";

/// Reminder file used when none is configured
pub const DEFAULT_STORE_PATH: &str = "data/reminders.json";

/// Beijing time
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Upper bound on a single provider call, in seconds
pub const SEND_TIMEOUT_SECS: u64 = 30;

/// Title used for reminders stored without one
pub const DEFAULT_TITLE: &str = "提醒";

/// Marker prepended to every reminder push title
pub const TITLE_MARKER: &str = "⏰";

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub store_path: PathBuf,
    pub utc_offset_hours: i32,
    pub template: Template,
    pub endpoint: String,
}

impl Config {
    pub fn new(
        token: Option<String>,
        store_path: PathBuf,
        utc_offset_hours: i32,
        template: Template,
    ) -> AppResult<Self> {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::config("PUSHPLUS_TOKEN is not set"))?;

        if !(-23..=23).contains(&utc_offset_hours) {
            return Err(AppError::config(format!(
                "UTC offset must be between -23 and 23 hours, got {}",
                utc_offset_hours
            )));
        }

        Ok(Self {
            token,
            store_path,
            utc_offset_hours,
            template,
            endpoint: PUSHPLUS_API.to_string(),
        })
    }

    /// Point the sender at a different provider URL.
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}
