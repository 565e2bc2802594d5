//! Long-running operation polling
//!
//! A [`Poller`] is created from the initial response of a long-running
//! operation and re-issues status requests through the same transport the
//! operation was started with, so authentication and pipeline headers carry
//! over. Waiting honours a caller-supplied [`CancellationToken`].

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{map_status_error, HttpError, HttpErrorKind, Result};
use crate::transport::{DynTransport, HttpRequest, HttpResponse};

/// Where the final result of an operation is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinalStateVia {
    /// `Azure-AsyncOperation` header, final resource at `resourceLocation`
    AzureAsyncOperation,
    /// `Location` header
    #[default]
    Location,
    /// The original request URL
    OriginalUri,
    /// `Operation-Location` header, final resource at `resourceLocation`
    OperationLocation,
}

/// Status of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LongRunningStatus {
    /// Accepted but not started
    NotStarted,
    /// Running
    InProgress,
    /// Completed successfully
    Succeeded,
    /// Completed with failure
    Failed,
    /// Cancelled by the service
    Cancelled,
    /// A service-specific status
    Other(String),
}

impl LongRunningStatus {
    /// Parse a wire status
    pub fn from_wire(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "notstarted" => LongRunningStatus::NotStarted,
            "inprogress" | "running" | "accepted" | "creating" | "updating" | "deleting" =>
                LongRunningStatus::InProgress,
            "succeeded" => LongRunningStatus::Succeeded,
            "failed" => LongRunningStatus::Failed,
            "canceled" | "cancelled" => LongRunningStatus::Cancelled,
            _ => LongRunningStatus::Other(status.to_string()),
        }
    }

    /// Whether the status is terminal
    pub fn is_complete(&self) -> bool {
        matches!(self, LongRunningStatus::Succeeded | LongRunningStatus::Failed | LongRunningStatus::Cancelled)
    }
}

/// Snapshot returned by each poll
#[derive(Debug, Clone, PartialEq)]
pub struct PollResponse<T> {
    status: LongRunningStatus,
    value: Option<T>,
    retry_after: Option<Duration>,
}

impl<T> PollResponse<T> {
    /// Create a snapshot
    pub fn new(status: LongRunningStatus, value: Option<T>, retry_after: Option<Duration>) -> Self {
        Self { status, value, retry_after }
    }

    /// Operation status
    pub fn status(&self) -> &LongRunningStatus { &self.status }

    /// Decoded poll body, when it matched the result type
    pub fn value(&self) -> Option<&T> { self.value.as_ref() }

    /// Delay the service asked for
    pub fn retry_after(&self) -> Option<Duration> { self.retry_after }
}

/// Interval selection between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingStrategy {
    /// Always wait the same interval
    FixedInterval(Duration),
    /// Wait what `Retry-After` asks for, else the fallback
    RetryAfter {
        /// Delay when the service gives none
        fallback: Duration,
    },
}

impl PollingStrategy {
    /// Delay before the next poll
    pub fn delay(&self, retry_after: Option<Duration>) -> Duration {
        match self {
            PollingStrategy::FixedInterval(interval) => *interval,
            PollingStrategy::RetryAfter { fallback } => retry_after.unwrap_or(*fallback),
        }
    }
}

/// Read `retry-after-ms`, `x-ms-retry-after-ms` or `retry-after` (seconds)
pub fn parse_retry_after(response: &HttpResponse) -> Option<Duration> {
    for header in ["retry-after-ms", "x-ms-retry-after-ms"] {
        if let Some(ms) = response.header(header).and_then(|v| v.trim().parse::<u64>().ok()) {
            return Some(Duration::from_millis(ms));
        }
    }
    response.header("retry-after").and_then(|v| v.trim().parse::<u64>().ok()).map(Duration::from_secs)
}

fn status_from_body(body: Option<&serde_json::Value>) -> Option<LongRunningStatus> {
    let body = body?;
    body.get("status")
        .or_else(|| body.pointer("/properties/provisioningState"))
        .and_then(|v| v.as_str())
        .map(LongRunningStatus::from_wire)
}

fn json_body(response: &HttpResponse) -> Option<serde_json::Value> {
    if response.body.is_empty() {
        None
    } else {
        serde_json::from_slice(&response.body).ok()
    }
}

/// Async poller over a long-running operation
pub struct Poller<T> {
    transport: DynTransport,
    strategy: PollingStrategy,
    final_state_via: FinalStateVia,
    method: String,
    original_url: String,
    poll_url: Option<String>,
    location_url: Option<String>,
    status: LongRunningStatus,
    retry_after: Option<Duration>,
    last_body: Option<serde_json::Value>,
    _result: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Poller<T> {
    /// Start polling from the initial response of `request`
    pub fn new(
        transport: DynTransport,
        request: &HttpRequest,
        initial: HttpResponse,
        strategy: PollingStrategy,
        final_state_via: FinalStateVia,
    ) -> Result<Self> {
        if !initial.is_success() {
            return Err(map_status_error(initial, &[], HttpErrorKind::HttpResponse));
        }
        let location_url = initial.header("location").map(str::to_string);
        let poll_url = initial
            .header("operation-location")
            .or_else(|| initial.header("azure-asyncoperation"))
            .map(str::to_string)
            .or_else(|| location_url.clone());
        let body = json_body(&initial);
        let status = status_from_body(body.as_ref()).unwrap_or_else(|| {
            if poll_url.is_some() || initial.status == 202 {
                LongRunningStatus::InProgress
            } else {
                LongRunningStatus::Succeeded
            }
        });
        debug!(url = %request.url, status = ?status, "long-running operation started");

        Ok(Self {
            transport,
            strategy,
            final_state_via,
            method: request.method.clone(),
            original_url: request.url.clone(),
            poll_url,
            location_url,
            status,
            retry_after: parse_retry_after(&initial),
            last_body: body,
            _result: PhantomData,
        })
    }

    /// Current status
    pub fn status(&self) -> &LongRunningStatus { &self.status }

    /// Issue one status request
    pub async fn poll(&mut self) -> Result<PollResponse<T>> {
        if self.status.is_complete() {
            return Ok(self.snapshot());
        }
        let url = self.poll_url.clone().unwrap_or_else(|| self.original_url.clone());
        let response = self.transport.send(HttpRequest::new("GET", url)).await?;
        if !response.is_success() {
            return Err(map_status_error(response, &[], HttpErrorKind::HttpResponse));
        }
        if let Some(location) = response.header("location") {
            self.location_url = Some(location.to_string());
        }
        self.retry_after = parse_retry_after(&response);
        let body = json_body(&response);
        self.status = status_from_body(body.as_ref()).unwrap_or(if response.status == 202 {
            LongRunningStatus::InProgress
        } else {
            LongRunningStatus::Succeeded
        });
        self.last_body = body;
        debug!(status = ?self.status, "polled long-running operation");
        Ok(self.snapshot())
    }

    /// Poll until a terminal status, sleeping per the strategy between polls
    pub async fn wait_for_completion(&mut self, cancel: &CancellationToken) -> Result<PollResponse<T>> {
        while !self.status.is_complete() {
            let delay = self.strategy.delay(self.retry_after);
            tokio::select! {
                _ = cancel.cancelled() => return Err(HttpError::Cancelled),
                _ = tokio::time::sleep(delay) => {
                    self.poll().await?;
                }
            }
        }
        match &self.status {
            LongRunningStatus::Failed => Err(HttpError::PollingFailed("operation failed".to_string())),
            LongRunningStatus::Cancelled => Err(HttpError::PollingFailed("operation was cancelled".to_string())),
            _ => Ok(self.snapshot()),
        }
    }

    /// Fetch the final result of a succeeded operation
    pub async fn final_result(&mut self) -> Result<T> {
        if self.status != LongRunningStatus::Succeeded {
            return Err(HttpError::PollingFailed(format!("operation has not succeeded: {:?}", self.status)));
        }
        let resource_location = self
            .last_body
            .as_ref()
            .and_then(|b| b.get("resourceLocation"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let url = match self.final_state_via {
            FinalStateVia::Location => self.location_url.clone(),
            FinalStateVia::OriginalUri => Some(self.original_url.clone()),
            FinalStateVia::AzureAsyncOperation | FinalStateVia::OperationLocation => resource_location,
        }
        .or_else(|| matches!(self.method.as_str(), "PUT" | "PATCH").then(|| self.original_url.clone()));

        match url {
            Some(url) => {
                let response = self.transport.send(HttpRequest::new("GET", url)).await?;
                if !response.is_success() {
                    return Err(map_status_error(response, &[], HttpErrorKind::HttpResponse));
                }
                response.json()
            }
            None => Ok(serde_json::from_value(self.last_body.clone().unwrap_or(serde_json::Value::Null))?),
        }
    }

    fn snapshot(&self) -> PollResponse<T> {
        let value = self.last_body.clone().and_then(|b| serde_json::from_value(b).ok());
        PollResponse::new(self.status.clone(), value, self.retry_after)
    }
}

/// Run a future to completion on a fresh current-thread runtime
pub fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| HttpError::Transport(e.to_string()))?;
    Ok(runtime.block_on(future))
}

/// Blocking wrapper around a [`Poller`]
pub struct SyncPoller<T> {
    poller: Poller<T>,
    runtime: tokio::runtime::Runtime,
    cancel: CancellationToken,
}

impl<T: DeserializeOwned> SyncPoller<T> {
    /// Wrap a poller
    pub fn new(poller: Poller<T>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { poller, runtime, cancel: CancellationToken::new() })
    }

    /// Token cancelling [`SyncPoller::wait_for_completion`] from another thread
    pub fn cancellation_token(&self) -> CancellationToken { self.cancel.clone() }

    /// Current status
    pub fn status(&self) -> &LongRunningStatus { self.poller.status() }

    /// Issue one status request
    pub fn poll(&mut self) -> Result<PollResponse<T>> { self.runtime.block_on(self.poller.poll()) }

    /// Block until a terminal status
    pub fn wait_for_completion(&mut self) -> Result<PollResponse<T>> {
        let cancel = self.cancel.clone();
        self.runtime.block_on(self.poller.wait_for_completion(&cancel))
    }

    /// Fetch the final result
    pub fn final_result(&mut self) -> Result<T> { self.runtime.block_on(self.poller.final_result()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(LongRunningStatus::from_wire("Succeeded"), LongRunningStatus::Succeeded);
        assert_eq!(LongRunningStatus::from_wire("Canceled"), LongRunningStatus::Cancelled);
        assert_eq!(LongRunningStatus::from_wire("Running"), LongRunningStatus::InProgress);
        assert!(!LongRunningStatus::from_wire("Provisioning").is_complete());
    }

    #[test]
    fn test_strategy_delay() {
        let fixed = PollingStrategy::FixedInterval(Duration::from_secs(2));
        assert_eq!(fixed.delay(Some(Duration::from_secs(9))), Duration::from_secs(2));

        let retry = PollingStrategy::RetryAfter { fallback: Duration::from_secs(1) };
        assert_eq!(retry.delay(Some(Duration::from_secs(9))), Duration::from_secs(9));
        assert_eq!(retry.delay(None), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_retry_after() {
        let response = HttpResponse::new(202).with_header("Retry-After", "5");
        assert_eq!(parse_retry_after(&response), Some(Duration::from_secs(5)));
        let response = HttpResponse::new(202).with_header("retry-after-ms", "250");
        assert_eq!(parse_retry_after(&response), Some(Duration::from_millis(250)));
        assert_eq!(parse_retry_after(&HttpResponse::new(202)), None);
    }
}
