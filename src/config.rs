// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::render::TemplateOptions;

pub const DEFAULT_NOAA_API_URL: &str = "https://api.weather.gov/alerts";
pub const DEFAULT_PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Identifies us to the NOAA API when no `[user_agent]` section is
/// configured; api.weather.gov rejects anonymous clients.
pub const DEFAULT_USER_AGENT: &str =
    concat!("noaa-alerts/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub pushover: PushoverSettings,
    pub noaa: NoaaSettings,
    pub user_agent: UserAgentSettings,
    pub events: EventsSettings,
    pub schedule: ScheduleSettings,
    pub template: TemplateOptions,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PushoverSettings {
    pub token: String,
    pub user: String,
    pub api_url: String,
    /// Base URL for self-hosted detail pages; pushes link to the NOAA page
    /// when unset.
    pub base_url: Option<String>,
    pub test_message: bool,
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            user: String::new(),
            api_url: DEFAULT_PUSHOVER_API_URL.to_string(),
            base_url: None,
            test_message: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoaaSettings {
    pub api_url: String,
}

impl Default for NoaaSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_NOAA_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserAgentSettings {
    pub app_name: Option<String>,
    pub version: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventsSettings {
    /// Event names that match but never notify.
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleSettings {
    pub fetch_interval_minutes: u64,
    pub vacuum_interval_hours: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            fetch_interval_minutes: 5,
            vacuum_interval_hours: 168,
        }
    }
}

impl Settings {
    /// Load from a TOML file, then apply env overrides for the Pushover
    /// credentials (`PUSHOVER_TOKEN`, `PUSHOVER_USER`). A missing file
    /// yields pure defaults — useful with everything passed via env.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config from {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display()))?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Settings::default()
        };

        if let Ok(token) = std::env::var("PUSHOVER_TOKEN") {
            settings.pushover.token = token;
        }
        if let Ok(user) = std::env::var("PUSHOVER_USER") {
            settings.pushover.user = user;
        }

        if let Some(base_url) = &mut settings.pushover.base_url {
            while base_url.ends_with('/') {
                base_url.pop();
            }
        }

        Ok(settings)
    }

    /// `app/version (contact)` when the `[user_agent]` section is complete,
    /// the crate default otherwise.
    pub fn user_agent_string(&self) -> String {
        match (
            &self.user_agent.app_name,
            &self.user_agent.version,
            &self.user_agent.contact,
        ) {
            (Some(app), Some(version), Some(contact)) => {
                format!("{app}/{version} ({contact})")
            }
            _ => {
                warn!("user agent not configured, using default");
                DEFAULT_USER_AGENT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial_test::serial]
    fn missing_sections_fall_back_to_defaults() {
        std::env::remove_var("PUSHOVER_TOKEN");
        std::env::remove_var("PUSHOVER_USER");

        let file = write_config(
            r#"
            [pushover]
            token = "tok"
            user = "usr"
            "#,
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.pushover.api_url, DEFAULT_PUSHOVER_API_URL);
        assert_eq!(settings.noaa.api_url, DEFAULT_NOAA_API_URL);
        assert_eq!(settings.schedule.fetch_interval_minutes, 5);
        assert_eq!(settings.schedule.vacuum_interval_hours, 168);
        assert!(settings.events.ignored.is_empty());
        assert!(!settings.template.show_expiration);
    }

    #[test]
    #[serial_test::serial]
    fn env_overrides_credentials() {
        let file = write_config(
            r#"
            [pushover]
            token = "file-token"
            user = "file-user"
            "#,
        );
        std::env::set_var("PUSHOVER_TOKEN", "env-token");
        std::env::set_var("PUSHOVER_USER", "env-user");
        let settings = Settings::load(file.path()).unwrap();
        std::env::remove_var("PUSHOVER_TOKEN");
        std::env::remove_var("PUSHOVER_USER");

        assert_eq!(settings.pushover.token, "env-token");
        assert_eq!(settings.pushover.user, "env-user");
    }

    #[test]
    #[serial_test::serial]
    fn base_url_loses_trailing_slash() {
        std::env::remove_var("PUSHOVER_TOKEN");
        std::env::remove_var("PUSHOVER_USER");

        let file = write_config(
            r#"
            [pushover]
            base_url = "https://alerts.example.test/"
            "#,
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(
            settings.pushover.base_url.as_deref(),
            Some("https://alerts.example.test")
        );
    }

    #[test]
    fn user_agent_requires_all_three_fields() {
        let mut settings = Settings::default();
        assert_eq!(settings.user_agent_string(), DEFAULT_USER_AGENT);

        settings.user_agent.app_name = Some("watcher".to_string());
        settings.user_agent.version = Some("2.1".to_string());
        assert_eq!(settings.user_agent_string(), DEFAULT_USER_AGENT);

        settings.user_agent.contact = Some("ops@example.test".to_string());
        assert_eq!(settings.user_agent_string(), "watcher/2.1 (ops@example.test)");
    }

    #[test]
    #[serial_test::serial]
    fn ignored_events_parse_as_list() {
        std::env::remove_var("PUSHOVER_TOKEN");
        std::env::remove_var("PUSHOVER_USER");

        let file = write_config(
            r#"
            [events]
            ignored = ["Rip Current Statement", "Frost Advisory"]
            "#,
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.events.ignored.len(), 2);
    }
}
