use std::time::Duration;

use chrono::Local;
use serde::Serialize;

use crate::config::ConfigStore;
use crate::domain::{DEFAULT_TIMEOUT, FetchOutcome, Settings, truncate_to_minute};
use crate::error::KeplerError;
use crate::fetch::{Fetcher, KeplerSource};
use crate::store::{Paths, write_bytes_atomic};
use crate::validate::{is_keplers, missing_satellites};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflight,
    Download,
    Verify,
    Store,
}

impl Phase {
    pub fn step(self) -> u8 {
        match self {
            Phase::Preflight => 1,
            Phase::Download => 2,
            Phase::Verify => 3,
            Phase::Store => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

// Two runs against the same paths must not overlap.
#[derive(Clone)]
pub struct Updater<S: KeplerSource> {
    paths: Paths,
    config: ConfigStore,
    fetcher: Fetcher<S>,
    timeout: Duration,
}

impl<S: KeplerSource> Updater<S> {
    pub fn new(paths: Paths, source: S) -> Self {
        let config = ConfigStore::new(paths.settings_path());
        Self {
            paths,
            config,
            fetcher: Fetcher::new(source),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn source(&self) -> &S {
        self.fetcher.source()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn load_settings(&self) -> Settings {
        self.config.load()
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), KeplerError> {
        self.config.save(settings)
    }

    pub fn run(&self, settings: &mut Settings, sink: &dyn ProgressSink) -> FetchOutcome {
        tracing::info!(url = %settings.url, "starting Kepler update");

        let body = match self.fetcher.fetch(&settings.url, self.timeout, sink) {
            Ok(body) => body,
            Err(failure) => return failure.into(),
        };

        sink.event(ProgressEvent::new(Phase::Verify, "verifying Kepler data"));
        let text = String::from_utf8_lossy(&body);
        if !is_keplers(&text) {
            let missing = missing_satellites(&text);
            tracing::warn!(?missing, bytes = body.len(), "downloaded data rejected");
            return FetchOutcome::ValidationFailed;
        }

        let dataset_path = self.paths.dataset_path();
        if let Err(err) = write_bytes_atomic(&dataset_path, &body) {
            tracing::warn!(path = %dataset_path, "writing Kepler data failed: {err}");
            return FetchOutcome::PersistenceError {
                reason: err.to_string(),
            };
        }

        let timestamp = truncate_to_minute(Local::now().naive_local());
        settings.last_success = Some(timestamp);
        if let Err(err) = self.config.save(settings) {
            tracing::warn!(path = %self.config.path(), "saving settings failed: {err}");
        }

        sink.event(ProgressEvent::new(Phase::Store, format!("saved {dataset_path}")));
        tracing::info!(path = %dataset_path, bytes = body.len(), "Kepler data updated");
        FetchOutcome::Success {
            bytes: body.len(),
            timestamp,
        }
    }
}
