//! Error types for generated clients

use serde::{Deserialize, Serialize};

use crate::transport::HttpResponse;

/// Type alias for structured error handling in runtime operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Exception kinds a status code can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpErrorKind {
    /// 401 and friends
    ClientAuthentication,
    /// 404
    ResourceNotFound,
    /// 304, 409, 412
    ResourceModified,
    /// Anything else
    HttpResponse,
}

impl HttpErrorKind {
    /// Parse an exception name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ClientAuthentication" => Some(HttpErrorKind::ClientAuthentication),
            "ResourceNotFound" => Some(HttpErrorKind::ResourceNotFound),
            "ResourceModified" => Some(HttpErrorKind::ResourceModified),
            "HttpResponse" => Some(HttpErrorKind::HttpResponse),
            _ => None,
        }
    }
}

/// Canonical error type of generated clients.
///
/// Status-driven variants carry the full response so callers can decode a
/// typed error body.
#[derive(thiserror::Error, Debug)]
pub enum HttpError {
    /// The service rejected the credentials
    #[error("client authentication failed (status {})", .0.status)]
    ClientAuthentication(HttpResponse),

    /// The addressed resource does not exist
    #[error("resource not found (status {})", .0.status)]
    ResourceNotFound(HttpResponse),

    /// The resource was modified concurrently or a precondition failed
    #[error("resource modified (status {})", .0.status)]
    ResourceModified(HttpResponse),

    /// Any other unexpected status
    #[error("unexpected status {}: {}", .0.status, .0.text())]
    HttpResponse(HttpResponse),

    /// No response could be obtained
    #[error("Transport error: {0}")]
    Transport(String),

    /// Failure to serialize or deserialize a payload
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// A long-running operation reached a failed terminal state
    #[error("long-running operation failed: {0}")]
    PollingFailed(String),

    /// A client was built without a required setting
    #[error("client builder requires `{0}`")]
    MissingSetting(String),
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self { HttpError::Serialization(err.to_string()) }
}

impl HttpError {
    /// Build the status-driven variant for a kind
    pub fn from_kind(kind: HttpErrorKind, response: HttpResponse) -> Self {
        match kind {
            HttpErrorKind::ClientAuthentication => HttpError::ClientAuthentication(response),
            HttpErrorKind::ResourceNotFound => HttpError::ResourceNotFound(response),
            HttpErrorKind::ResourceModified => HttpError::ResourceModified(response),
            HttpErrorKind::HttpResponse => HttpError::HttpResponse(response),
        }
    }

    /// Response behind a status-driven error
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            HttpError::ClientAuthentication(r)
            | HttpError::ResourceNotFound(r)
            | HttpError::ResourceModified(r)
            | HttpError::HttpResponse(r) => Some(r),
            _ => None,
        }
    }

    /// Status code behind a status-driven error
    pub fn status(&self) -> Option<u16> { self.response().map(|r| r.status) }
}

/// Map an unexpected response to an error through a status table.
///
/// Codes missing from `table` raise `default`.
pub fn map_status_error(response: HttpResponse, table: &[(u16, HttpErrorKind)], default: HttpErrorKind) -> HttpError {
    let kind = table.iter().find(|(code, _)| *code == response.status).map(|(_, kind)| *kind).unwrap_or(default);
    HttpError::from_kind(kind, response)
}

/// Return the response when its status is expected, else the mapped error
pub fn check_status(
    response: HttpResponse,
    expected: &[u16],
    table: &[(u16, HttpErrorKind)],
    default: HttpErrorKind,
) -> Result<HttpResponse> {
    if expected.contains(&response.status) {
        Ok(response)
    } else {
        Err(map_status_error(response, table, default))
    }
}

/// Like [`check_status`], with the expected statuses given as a predicate
pub fn check_status_by(
    response: HttpResponse,
    expected: impl Fn(u16) -> bool,
    table: &[(u16, HttpErrorKind)],
    default: HttpErrorKind,
) -> Result<HttpResponse> {
    if expected(response.status) {
        Ok(response)
    } else {
        Err(map_status_error(response, table, default))
    }
}

/// Like [`map_status_error`], consulting status classes (`4` for `4XX`) after exact codes
pub fn map_status_error_ranged(
    response: HttpResponse,
    table: &[(u16, HttpErrorKind)],
    ranges: &[(u8, HttpErrorKind)],
    default: HttpErrorKind,
) -> HttpError {
    let class = response.status / 100;
    let kind = table
        .iter()
        .find(|(code, _)| *code == response.status)
        .map(|(_, kind)| *kind)
        .or_else(|| ranges.iter().find(|(c, _)| u16::from(*c) == class).map(|(_, kind)| *kind))
        .unwrap_or(default);
    HttpError::from_kind(kind, response)
}

/// [`check_status_by`] with a status class table
pub fn check_status_ranged(
    response: HttpResponse,
    expected: impl Fn(u16) -> bool,
    table: &[(u16, HttpErrorKind)],
    ranges: &[(u8, HttpErrorKind)],
    default: HttpErrorKind,
) -> Result<HttpResponse> {
    if expected(response.status) {
        Ok(response)
    } else {
        Err(map_status_error_ranged(response, table, ranges, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(u16, HttpErrorKind)] = &[
        (401, HttpErrorKind::ClientAuthentication),
        (404, HttpErrorKind::ResourceNotFound),
        (409, HttpErrorKind::ResourceModified),
    ];

    #[test]
    fn test_from() {
        let err = serde_json::from_str::<serde_json::Value>("not-json")
            .expect_err("Expected JSON parsing to fail");
        let herr: HttpError = err.into();

        match herr {
            HttpError::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("expected Serialization error variant"),
        }
    }

    #[test]
    fn test_map_status_error() {
        let err = map_status_error(HttpResponse::new(404), TABLE, HttpErrorKind::HttpResponse);
        assert!(matches!(err, HttpError::ResourceNotFound(_)));

        let err = map_status_error(HttpResponse::new(500), TABLE, HttpErrorKind::HttpResponse);
        assert!(matches!(err, HttpError::HttpResponse(_)));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(HttpResponse::new(200), &[200], TABLE, HttpErrorKind::HttpResponse).is_ok());
        let err = check_status(HttpResponse::new(401), &[200], TABLE, HttpErrorKind::HttpResponse)
            .expect_err("401 is unexpected");
        assert!(matches!(err, HttpError::ClientAuthentication(_)));
    }

    #[test]
    fn test_check_status_by_range() {
        let expected = |status: u16| matches!(status, 200 | 300..=399);
        assert!(check_status_by(HttpResponse::new(302), expected, TABLE, HttpErrorKind::HttpResponse).is_ok());
        let err = check_status_by(HttpResponse::new(409), expected, TABLE, HttpErrorKind::HttpResponse)
            .expect_err("409 is unexpected");
        assert!(matches!(err, HttpError::ResourceModified(_)));
    }

    #[test]
    fn test_ranges_apply_after_exact_codes() {
        let ranges = &[(4, HttpErrorKind::ResourceModified)];
        let expected = |status: u16| status == 200;
        let err = check_status_ranged(HttpResponse::new(404), expected, TABLE, ranges, HttpErrorKind::HttpResponse)
            .expect_err("404 is unexpected");
        assert!(matches!(err, HttpError::ResourceNotFound(_)));

        let err = map_status_error_ranged(HttpResponse::new(422), TABLE, ranges, HttpErrorKind::HttpResponse);
        assert!(matches!(err, HttpError::ResourceModified(_)));

        let err = map_status_error_ranged(HttpResponse::new(503), TABLE, ranges, HttpErrorKind::HttpResponse);
        assert!(matches!(err, HttpError::HttpResponse(_)));
    }
}
