//! Configuration for backup importers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::chats::errors::{ChatError, ChatResult};

/// Settings shared by backup importers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Name of the account owner as it appears in the backup.
    pub owner_name: String,
    /// Messages sent at or before this instant are skipped.
    pub since: NaiveDateTime,
    /// Participants whose name contains this character are handles, not
    /// people (e.g. `1234@facebook.com`).
    pub handle_marker: char,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            owner_name: String::new(),
            since: default_since(),
            handle_marker: '@',
        }
    }
}

// Facebook exports before 2011 carry unreliable timestamps.
fn default_since() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2011, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl ImportConfig {
    /// Config for the given owner with default settings.
    #[must_use]
    pub fn new(owner_name: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
            ..Self::default()
        }
    }

    /// Set the cut-off instant.
    #[must_use]
    pub const fn with_since(mut self, since: NaiveDateTime) -> Self {
        self.since = since;
        self
    }

    /// Set the handle marker.
    #[must_use]
    pub const fn with_handle_marker(mut self, marker: char) -> Self {
        self.handle_marker = marker;
        self
    }

    /// Whether `name` denotes a handle rather than a person.
    #[must_use]
    pub fn is_handle(&self, name: &str) -> bool {
        name.contains(self.handle_marker)
    }

    /// Load and validate a JSON config document.
    ///
    /// # Errors
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_json_str(text: &str) -> ChatResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the owner name is empty or the handle marker is
    /// whitespace.
    pub fn validate(&self) -> ChatResult<()> {
        if self.owner_name.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "owner_name must not be empty".to_string(),
            ));
        }

        if self.handle_marker.is_whitespace() {
            return Err(ChatError::InvalidConfig(
                "handle_marker must not be whitespace".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.handle_marker, '@');
        assert_eq!(config.since.to_string(), "2011-01-01 00:00:00");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let since = NaiveDate::from_ymd_opt(2015, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let config = ImportConfig::new("Lyra")
            .with_since(since)
            .with_handle_marker('#');

        assert!(config.validate().is_ok());
        assert_eq!(config.since, since);
        assert!(config.is_handle("#channel"));
        assert!(!config.is_handle("someone@example.com"));
    }

    #[test]
    fn test_from_json_str() {
        let config = ImportConfig::from_json_str(r#"{"owner_name": "Lyra"}"#).unwrap();
        assert_eq!(config, ImportConfig::new("Lyra"));

        let config =
            ImportConfig::from_json_str(r#"{"owner_name": "Lyra", "since": "2012-01-01T00:00:00"}"#)
                .unwrap();
        assert_eq!(config.since.to_string(), "2012-01-01 00:00:00");

        assert!(matches!(
            ImportConfig::from_json_str("{}"),
            Err(ChatError::InvalidConfig(_))
        ));
        assert!(matches!(
            ImportConfig::from_json_str("not json"),
            Err(ChatError::Serialization(_))
        ));
    }
}
