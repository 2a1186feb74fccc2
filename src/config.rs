//! Mailbox service configuration

use crate::error::{Error, Result};
use crate::parse::render_timestamp;
use chrono::NaiveDateTime;
use std::env;

/// Default upper bound of the rule priority range.
pub const DEFAULT_MAX_RULE_PRIORITY: u8 = 10;

/// Default `chrono` format of the `received:` metadata value.
pub const DEFAULT_RECEIVED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Tunables for [`MailboxService`](crate::MailboxService)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Lowest rule priority accepted (1 is always the highest).
    pub max_rule_priority: u8,
    /// Format used to parse and render `received:` timestamps.
    pub received_format: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_rule_priority: DEFAULT_MAX_RULE_PRIORITY,
            received_format: DEFAULT_RECEIVED_FORMAT.to_string(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables
    ///
    /// Reads from `.env` file if present. Optional (with defaults):
    /// - `MAILBOX_MAX_RULE_PRIORITY` (default: `10`)
    /// - `MAILBOX_RECEIVED_FORMAT` (default: `%Y-%m-%d %H:%M`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `MAILBOX_MAX_RULE_PRIORITY` is not
    /// an integer in `1..=255` or `MAILBOX_RECEIVED_FORMAT` fails
    /// [`RouterConfig::validate`].
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let max_rule_priority = match env::var("MAILBOX_MAX_RULE_PRIORITY") {
            Ok(raw) => parse_max_priority(&raw)?,
            Err(_) => DEFAULT_MAX_RULE_PRIORITY,
        };

        let config = Self {
            max_rule_priority,
            received_format: env::var("MAILBOX_RECEIVED_FORMAT")
                .unwrap_or_else(|_| DEFAULT_RECEIVED_FORMAT.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that `max_rule_priority` is at least 1 and that
    /// `received_format` renders a timestamp that it parses back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.max_rule_priority == 0 {
            return Err(Error::Config("max_rule_priority must be at least 1".into()));
        }

        let sample = NaiveDateTime::default();
        let rendered = render_timestamp(sample, &self.received_format)?;
        NaiveDateTime::parse_from_str(&rendered, &self.received_format).map_err(|e| {
            Error::Config(format!(
                "Invalid received format '{}': {e}",
                self.received_format
            ))
        })?;
        Ok(())
    }

    /// Whether `priority` lies in `1..=max_rule_priority`.
    #[must_use]
    pub fn accepts_priority(&self, priority: u8) -> bool {
        (1..=self.max_rule_priority).contains(&priority)
    }
}

fn parse_max_priority(raw: &str) -> Result<u8> {
    match raw.trim().parse::<u8>() {
        Ok(0) => Err(Error::Config(
            "Invalid MAILBOX_MAX_RULE_PRIORITY: must be at least 1".into(),
        )),
        Ok(value) => Ok(value),
        Err(e) => Err(Error::Config(format!(
            "Invalid MAILBOX_MAX_RULE_PRIORITY: {e}"
        ))),
    }
}
