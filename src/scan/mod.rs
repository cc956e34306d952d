//! Vulnerability scan polling
//!
//! The [`ScanPoller`] drives the bounded wait-then-query loop over the
//! registry's scan report endpoint. Initiation failures are fatal and never
//! retried; polling retries only while the report status is non-terminal,
//! with a hard attempt ceiling. The loop races every suspension against a
//! cancellation token so a caller-imposed deadline can stop it promptly.

use crate::logging::Logger;
use crate::registry::RegistryBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Fixed wait between scan queries
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Hard ceiling on scan queries per invocation (about 5 minutes of polling)
pub const MAX_ATTEMPTS: u32 = 30;

/// Scan report status as reported by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    Ok,
    Warn,
    Fail,
    Unsupported,
    Incomplete,
    Unscanned,
}

impl ScanStatus {
    /// A terminal status will not change with further polling.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanStatus::Incomplete | ScanStatus::Unscanned)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Ok => "OK",
            ScanStatus::Warn => "WARN",
            ScanStatus::Fail => "FAIL",
            ScanStatus::Unsupported => "UNSUPPORTED",
            ScanStatus::Incomplete => "INCOMPLETE",
            ScanStatus::Unscanned => "UNSCANNED",
        };
        write!(f, "{}", s)
    }
}

/// One scan query result: status plus the raw report payload
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub detail: serde_json::Value,
}

/// Terminal outcome of a polling run
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub detail: serde_json::Value,
    pub attempts: u32,
    pub elapsed_seconds: u64,
}

#[derive(Error, Debug)]
pub enum ScanError {
    /// Scan could not be started; indicates a structural problem, not latency
    #[error("scan initiation failed: {0}")]
    Initiation(String),
    /// A scan query itself failed (distinct from a non-terminal status)
    #[error("scan query failed on attempt {attempt}: {message}")]
    Query { attempt: u32, message: String },
    /// Attempt ceiling exhausted; carries the last non-terminal outcome
    #[error("scan did not complete after {} polls (last status: {})", .0.attempts, .0.status)]
    TimedOut(ScanOutcome),
    #[error("scan polling was cancelled")]
    Cancelled,
}

/// Drives the scan-query loop against a [`RegistryBackend`].
pub struct ScanPoller<'a> {
    backend: &'a dyn RegistryBackend,
    logger: &'a Logger,
    interval: Duration,
    max_attempts: u32,
}

impl<'a> ScanPoller<'a> {
    pub fn new(backend: &'a dyn RegistryBackend, logger: &'a Logger) -> Self {
        Self {
            backend,
            logger,
            interval: POLL_INTERVAL,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Override the polling schedule. Used to shorten tests.
    pub fn with_schedule(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.interval = interval;
        self.max_attempts = max_attempts;
        self
    }

    /// Initiate a scan for `image` and poll until a terminal status, the
    /// attempt ceiling, or cancellation.
    pub async fn poll(
        &self,
        image: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<ScanOutcome, ScanError> {
        self.backend
            .initiate_scan(image)
            .await
            .map_err(|e| ScanError::Initiation(e.to_string()))?;
        self.logger.debug(&format!("Scan initiated for {}", image));

        let started = tokio::time::Instant::now();
        let mut attempts: u32 = 0;
        let mut last: Option<ScanReport> = None;

        while attempts < self.max_attempts {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if attempts > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            attempts += 1;

            let report = self
                .backend
                .query_scan(image)
                .await
                .map_err(|e| ScanError::Query {
                    attempt: attempts,
                    message: e.to_string(),
                })?;
            self.logger.step(&format!(
                "Scan poll {}/{}: {}",
                attempts, self.max_attempts, report.status
            ));

            if report.status.is_terminal() {
                return Ok(ScanOutcome {
                    status: report.status,
                    detail: report.detail,
                    attempts,
                    elapsed_seconds: started.elapsed().as_secs(),
                });
            }
            last = Some(report);
        }

        // Ceiling reached while still non-terminal
        let (status, detail) = match last {
            Some(report) => (report.status, report.detail),
            None => (ScanStatus::Unscanned, serde_json::Value::Null),
        };
        Err(ScanError::TimedOut(ScanOutcome {
            status,
            detail,
            attempts,
            elapsed_seconds: started.elapsed().as_secs(),
        }))
    }
}
