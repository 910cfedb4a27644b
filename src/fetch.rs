use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;

use crate::app::{Phase, ProgressEvent, ProgressSink};
use crate::domain::{FetchOutcome, NetworkErrorKind, PreflightReason};
use crate::error::KeplerError;

const EXPECTED_CONTENT_TYPE: &str = "text/plain";
const MAX_REDIRECTS: usize = 10;
const MISSING_CONTENT_TYPE: &str = "response declares no content-type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    pub status: u16,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout(String),
    Connect(String),
    InvalidUrl(String),
    Other(String),
}

impl TransportError {
    pub fn detail(&self) -> &str {
        match self {
            TransportError::Timeout(detail)
            | TransportError::Connect(detail)
            | TransportError::InvalidUrl(detail)
            | TransportError::Other(detail) => detail,
        }
    }
}

pub trait KeplerSource: Send + Sync {
    fn head(&self, url: &str, timeout: Duration) -> Result<HeadResponse, TransportError>;
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

#[derive(Clone)]
pub struct KeplerHttpClient {
    client: Client,
}

impl KeplerHttpClient {
    pub fn new() -> Result<Self, KeplerError> {
        Self::build(true)
    }

    pub fn direct() -> Result<Self, KeplerError> {
        Self::build(false)
    }

    fn build(use_proxy: bool) -> Result<Self, KeplerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kepler-updater/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KeplerError::Http(err.to_string()))?,
        );
        let mut builder = Client::builder()
            .default_headers(headers)
            .redirect(Policy::limited(MAX_REDIRECTS));
        if !use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|err| KeplerError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl KeplerSource for KeplerHttpClient {
    fn head(&self, url: &str, timeout: Duration) -> Result<HeadResponse, TransportError> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .map_err(classify_error)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(HeadResponse {
            status: response.status().as_u16(),
            content_type,
        })
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(classify_error)?;
        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "download returned non-success status"
            );
        }
        let bytes = response.bytes().map_err(classify_error)?;
        Ok(bytes.to_vec())
    }
}

fn classify_error(err: reqwest::Error) -> TransportError {
    let detail = err.to_string();
    if err.is_timeout() {
        TransportError::Timeout(detail)
    } else if err.is_connect() {
        TransportError::Connect(detail)
    } else if err.is_builder() {
        TransportError::InvalidUrl(detail)
    } else {
        TransportError::Other(detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    PreflightRejected(PreflightReason),
    Network {
        kind: NetworkErrorKind,
        detail: String,
    },
}

impl From<FetchFailure> for FetchOutcome {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::PreflightRejected(reason) => FetchOutcome::PreflightRejected { reason },
            FetchFailure::Network { kind, detail } => FetchOutcome::NetworkError { kind, detail },
        }
    }
}

#[derive(Clone)]
pub struct Fetcher<S: KeplerSource> {
    source: S,
}

impl<S: KeplerSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<u8>, FetchFailure> {
        sink.event(ProgressEvent::new(Phase::Preflight, format!("checking {url}")));
        let start = Instant::now();
        self.preflight(url, timeout)?;
        tracing::debug!(latency_ms = start.elapsed().as_millis() as u64, "preflight passed");

        sink.event(ProgressEvent::new(Phase::Download, "downloading Kepler data"));
        let start = Instant::now();
        let body = self.source.get(url, timeout).map_err(|err| {
            let kind = match err {
                TransportError::Timeout(_) => NetworkErrorKind::Timeout,
                TransportError::Connect(_) => NetworkErrorKind::ConnectionFailed,
                TransportError::InvalidUrl(_) | TransportError::Other(_) => {
                    NetworkErrorKind::Unexpected
                }
            };
            network_failure("download", kind, err)
        })?;
        let elapsed = start.elapsed();
        tracing::info!(
            bytes = body.len(),
            latency_ms = elapsed.as_millis() as u64,
            "download finished"
        );
        sink.event(ProgressEvent {
            phase: Phase::Download,
            message: format!("downloaded {} bytes", body.len()),
            elapsed: Some(elapsed),
        });
        Ok(body)
    }

    pub fn preflight(&self, url: &str, timeout: Duration) -> Result<(), FetchFailure> {
        let head = self.source.head(url, timeout).map_err(|err| {
            let kind = match err {
                TransportError::Timeout(_) => NetworkErrorKind::Timeout,
                TransportError::Connect(_) | TransportError::InvalidUrl(_) => {
                    NetworkErrorKind::ConnectionFailed
                }
                TransportError::Other(_) => NetworkErrorKind::Unexpected,
            };
            network_failure("preflight", kind, err)
        })?;
        check_head(&head).inspect_err(|failure| {
            tracing::warn!(?failure, "preflight rejected endpoint");
        })
    }
}

/// Substring match on the content type: `text/plain; charset=utf-8` passes.
/// A response without the header at all is an unexpected network error, not
/// a rejection.
pub fn check_head(head: &HeadResponse) -> Result<(), FetchFailure> {
    if head.status != 200 {
        return Err(FetchFailure::PreflightRejected(PreflightReason::Status {
            code: head.status,
        }));
    }
    match head.content_type.as_deref() {
        Some(content_type) if content_type.contains(EXPECTED_CONTENT_TYPE) => Ok(()),
        Some(found) => Err(FetchFailure::PreflightRejected(
            PreflightReason::ContentType {
                found: found.to_string(),
            },
        )),
        None => Err(FetchFailure::Network {
            kind: NetworkErrorKind::Unexpected,
            detail: MISSING_CONTENT_TYPE.to_string(),
        }),
    }
}

fn network_failure(phase: &str, kind: NetworkErrorKind, err: TransportError) -> FetchFailure {
    tracing::warn!(phase, %kind, "request failed: {}", err.detail());
    FetchFailure::Network {
        kind,
        detail: err.detail().to_string(),
    }
}
