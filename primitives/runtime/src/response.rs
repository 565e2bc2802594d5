//! Typed responses

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::transport::HttpResponse;

/// Status, headers and a decoded value
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    status: u16,
    headers: BTreeMap<String, String>,
    value: T,
}

impl<T> Response<T> {
    /// Create a response
    pub fn new(status: u16, headers: BTreeMap<String, String>, value: T) -> Self { Self { status, headers, value } }

    /// Status code
    pub fn status(&self) -> u16 { self.status }

    /// Headers keyed by lower-case name
    pub fn headers(&self) -> &BTreeMap<String, String> { &self.headers }

    /// Header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Decoded value
    pub fn value(&self) -> &T { &self.value }

    /// Take the decoded value
    pub fn into_value(self) -> T { self.value }

    /// Transform the value, keeping status and headers
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response { status: self.status, headers: self.headers, value: f(self.value) }
    }
}

impl Response<HttpResponse> {
    /// Keep a raw response as-is
    pub fn raw(response: HttpResponse) -> Self {
        Self { status: response.status, headers: response.headers.clone(), value: response }
    }
}

impl<T: DeserializeOwned> Response<T> {
    /// Decode the JSON body of a raw response
    pub fn from_json(response: HttpResponse) -> Result<Self> {
        let value = response.json()?;
        Ok(Self { status: response.status, headers: response.headers, value })
    }
}

impl Response<()> {
    /// Drop the body of a raw response
    pub fn empty(response: HttpResponse) -> Self { Self { status: response.status, headers: response.headers, value: () } }
}
