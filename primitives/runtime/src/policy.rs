//! Request pipeline
//!
//! [`HttpPipeline`] wraps a transport and stamps credentials and tracking
//! headers on every request. It is itself a [`Transport`], so pagers and
//! pollers built from it keep the originating call's context.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::transport::{DynTransport, HttpRequest, HttpResponse, Transport};

/// Credential attached to outgoing requests
#[derive(Clone)]
pub enum Credential {
    /// Static key sent in a named header
    Key {
        /// Header name
        header: String,
        /// Key
        key: String,
    },
    /// OAuth2 bearer token
    Bearer {
        /// Token
        token: String,
    },
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Key { header, .. } => f.debug_struct("Key").field("header", header).finish_non_exhaustive(),
            Credential::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
        }
    }
}

/// Transport wrapper applying per-request policies
#[derive(Clone)]
pub struct HttpPipeline {
    inner: DynTransport,
    credential: Option<Credential>,
    request_id_header: Option<String>,
    repeatability: bool,
}

impl HttpPipeline {
    /// Wrap a transport with no policies
    pub fn new(inner: DynTransport) -> Self {
        Self { inner, credential: None, request_id_header: None, repeatability: false }
    }

    /// Attach a credential
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Stamp a fresh request id in `header` unless the caller set one
    pub fn with_request_id(mut self, header: impl Into<String>) -> Self {
        self.request_id_header = Some(header.into());
        self
    }

    /// Stamp `repeatability-request-id` and `repeatability-first-sent`
    pub fn with_repeatability(mut self) -> Self {
        self.repeatability = true;
        self
    }

    /// Share the pipeline as a dynamic transport
    pub fn into_dyn(self) -> DynTransport { Arc::new(self) }

    fn apply(&self, request: &mut HttpRequest) {
        if let Some(header) = &self.request_id_header {
            if request.header(header).is_none() {
                request.set_header(header, uuid::Uuid::new_v4().to_string());
            }
        }
        if self.repeatability && request.header("repeatability-request-id").is_none() {
            request.set_header("repeatability-request-id", uuid::Uuid::new_v4().to_string());
            request.set_header(
                "repeatability-first-sent",
                chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            );
        }
        match &self.credential {
            Some(Credential::Key { header, key }) => request.set_header(header, key.clone()),
            Some(Credential::Bearer { token }) => request.set_header("authorization", format!("Bearer {}", token)),
            None => {}
        }
    }
}

#[async_trait]
impl Transport for HttpPipeline {
    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        self.apply(&mut request);
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.inner.send(request).await?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    fn endpoint(&self) -> &str { self.inner.endpoint() }
}
