#![allow(dead_code)]

pub mod http_server;

use std::sync::Mutex;
use std::time::Duration;

use camino::Utf8PathBuf;

use kepler_updater::fetch::{HeadResponse, KeplerSource, TransportError};
use kepler_updater::store::Paths;

pub const LINE1: &str = "1 25338U 98030A   24291.52313451  .00000342  00000+0  15823-3 0  9990";
pub const LINE2: &str = "2 25338  98.5532 311.0781 0009614 241.6371 118.3841 14.26810291373456";

pub fn fixture() -> Vec<u8> {
    std::fs::read("tests/fixtures/weather.txt").unwrap()
}

/// One record: padded name line plus two element lines.
pub fn record(name: &str) -> String {
    format!("{name:<24}\n{LINE1}\n{LINE2}\n")
}

pub fn dataset(names: &[&str]) -> String {
    names.iter().map(|name| record(name)).collect()
}

pub fn temp_paths() -> (tempfile::TempDir, Paths) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("WXtoImg")).unwrap();
    (temp, Paths::new_with_root(root))
}

/// Scripted transport that records which requests were made.
pub struct FakeSource {
    head: Result<HeadResponse, TransportError>,
    body: Result<Vec<u8>, TransportError>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl FakeSource {
    pub fn serving(body: impl Into<Vec<u8>>) -> Self {
        Self {
            head: Ok(HeadResponse {
                status: 200,
                content_type: Some("text/plain; charset=utf-8".to_string()),
            }),
            body: Ok(body.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_head(mut self, status: u16, content_type: Option<&str>) -> Self {
        self.head = Ok(HeadResponse {
            status,
            content_type: content_type.map(str::to_string),
        });
        self
    }

    pub fn with_head_error(mut self, err: TransportError) -> Self {
        self.head = Err(err);
        self
    }

    pub fn with_body_error(mut self, err: TransportError) -> Self {
        self.body = Err(err);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|(method, _)| *method).collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, url)| url.clone()).collect()
    }
}

impl KeplerSource for FakeSource {
    fn head(&self, url: &str, _timeout: Duration) -> Result<HeadResponse, TransportError> {
        self.calls.lock().unwrap().push(("HEAD", url.to_string()));
        self.head.clone()
    }

    fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().unwrap().push(("GET", url.to_string()));
        self.body.clone()
    }
}
