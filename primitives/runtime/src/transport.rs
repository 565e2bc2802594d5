//! HTTP messages and the transport abstraction

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{HttpError, Result};

/// Characters left unescaped in path segments and query components
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encode a path segment or query component
pub fn encode_component(value: &str) -> String { utf8_percent_encode(value, COMPONENT).to_string() }

/// An outgoing HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Upper-case verb
    pub method: String,
    /// Absolute URL
    pub url: String,
    /// Headers, keyed by lower-case name
    pub headers: BTreeMap<String, String>,
    /// Body bytes
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request without headers or body
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), headers: BTreeMap::new(), body: None }
    }

    /// Set a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Set a header in place
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Append an encoded query parameter
    pub fn append_query(&mut self, name: &str, value: &str) {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(separator);
        self.url.push_str(&encode_component(name));
        self.url.push('=');
        self.url.push_str(&encode_component(value));
    }

    /// Serialize `value` as the JSON body
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        self.set_header("content-type", "application/json");
        Ok(self)
    }
}

/// An HTTP response as received
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Headers, keyed by lower-case name
    pub headers: BTreeMap<String, String>,
    /// Body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create an empty response with a status code
    pub fn new(status: u16) -> Self { Self { status, ..Default::default() } }

    /// Set a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set a JSON body
    pub fn with_json(mut self, value: &serde_json::Value) -> Self {
        self.body = value.to_string().into_bytes();
        self
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> { Ok(serde_json::from_slice(&self.body)?) }

    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }

    /// Whether the status is in the 2xx class
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// The base transport trait for single-request delivery.
///
/// Implementations perform the actual I/O. Request pipelines wrap another
/// transport and implement this trait themselves, so everything downstream
/// (paging, polling) shares one authentication and header context.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// Only failures to obtain a response at all are errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Returns the configured endpoint.
    fn endpoint(&self) -> &str;
}

/// Type alias for a shared, dynamically dispatched transport instance.
///
/// ```
/// use runtime::{DynTransport, Transport};
///
/// fn use_transport(t: DynTransport) {
///     println!("Using endpoint: {}", t.endpoint());
/// }
/// ```
pub type DynTransport = Arc<dyn Transport>;

/// Text form of a path, query or header value.
///
/// Strings pass through unquoted; other JSON values use their JSON text.
pub fn to_param<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(match serde_json::to_value(value)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    })
}

/// Join an endpoint and a path without doubling the separator
pub fn join_url(endpoint: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Fail with a transport error unless the URL is absolute
pub fn require_absolute(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(HttpError::Transport(format!("not an absolute URL: {}", url)))
    }
}
