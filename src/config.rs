use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{Settings, format_timestamp, parse_timestamp};
use crate::error::KeplerError;
use crate::store::write_bytes_atomic;

const KEY_URL: &str = "URL:";
const KEY_AUTO_MODE: &str = "AUTO-MODE:";
const KEY_LAST_UPDATE: &str = "LAST-UPDATE:";
const NEVER: &str = "never";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Utf8PathBuf,
}

impl ConfigStore {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn load(&self) -> Settings {
        match fs::read(self.path.as_std_path()) {
            Ok(raw) => parse_settings(&String::from_utf8_lossy(&raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path, "no settings file, using defaults");
                Settings::default()
            }
            Err(err) => {
                tracing::warn!(path = %self.path, "could not read settings file: {err}");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), KeplerError> {
        write_bytes_atomic(&self.path, render_settings(settings).as_bytes())?;
        tracing::debug!(path = %self.path, "settings saved");
        Ok(())
    }
}

/// Each line is a `KEY:` token and a value separated by whitespace. Leading
/// whitespace is ignored, so `URL:value` is not a URL line but `  URL: value` is.
pub fn parse_settings(content: &str) -> Settings {
    let mut settings = Settings::default();
    for (index, line) in content.lines().enumerate() {
        let Some((key, value)) = line.trim_start().split_once(char::is_whitespace) else {
            tracing::debug!(line = index + 1, "skipping settings line without a value");
            continue;
        };
        let value = value.trim_start();
        if value.is_empty() {
            tracing::debug!(line = index + 1, key, "skipping settings line without a value");
            continue;
        }
        match key {
            KEY_URL => settings.url = value.to_string(),
            KEY_AUTO_MODE => settings.auto_run = value == "True",
            KEY_LAST_UPDATE => match parse_timestamp(value) {
                Some(timestamp) => settings.last_success = Some(timestamp),
                None => {
                    tracing::debug!(line = index + 1, value, "skipping unparseable timestamp");
                }
            },
            _ => {
                tracing::debug!(line = index + 1, key, "skipping unrecognized settings line");
            }
        }
    }
    settings
}

pub fn render_settings(settings: &Settings) -> String {
    let auto_mode = if settings.auto_run { "True" } else { "False" };
    let last_update = settings
        .last_success
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| NEVER.to_string());
    format!(
        "{KEY_URL} {}\n{KEY_AUTO_MODE} {auto_mode}\n{KEY_LAST_UPDATE} {last_update}\n",
        settings.url
    )
}
