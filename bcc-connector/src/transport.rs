//! HTTP transport boundary
//!
//! The client talks to the service only through [`Transport`], so the whole
//! connector can be driven by a scripted transport in tests.

use crate::{Error, Result};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// HTTP method used by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A fully built request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// Raw response: status code and body bytes
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs one blocking request
///
/// Implementations return `Err` only when no response was obtained; status
/// handling is left to the caller.
pub trait Transport: Send + Sync {
    fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by a blocking reqwest client
pub struct HttpTransport {
    http_client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build the client once; the timeout covers connect and read
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .user_agent(concat!("bcc-connector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self { http_client })
    }
}

impl Transport for HttpTransport {
    fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.http_client.get(&request.url),
            Method::Post => self.http_client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| Error::Transport(e.to_string()))?
            .to_vec();

        debug!(status, bytes = body.len(), "Received response");
        Ok(HttpResponse { status, body })
    }
}
