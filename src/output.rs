use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{FetchOutcome, Settings, format_timestamp};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_outcome(outcome: &FetchOutcome) -> io::Result<()> {
        Self::print_json(outcome)
    }

    pub fn print_settings(settings: &Settings) -> io::Result<()> {
        Self::print_json(settings)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TextProgress;

impl ProgressSink for TextProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!(
                "[{}/4] {} ({} ms)",
                event.phase.step(),
                event.message,
                elapsed.as_millis()
            ),
            None => eprintln!("[{}/4] {}", event.phase.step(), event.message),
        }
    }
}

pub fn print_settings_summary(settings: &Settings) {
    println!("URL:         {}", settings.url);
    println!("Auto mode:   {}", if settings.auto_run { "on" } else { "off" });
    println!(
        "Last update: {}",
        settings
            .last_success
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "never".to_string())
    );
}
