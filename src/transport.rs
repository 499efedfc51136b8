/*!
Request transport: one POST per cycle carrying the argv as JSON.

The session only sees the `Transport` trait and the minimal `Response` model
below (status, lowercased headers, single-use body), so it can be driven by an
in-memory stub in tests.
*/

use std::collections::HashMap;
use std::io::{self, Read};

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::errors::ProxyError;

pub const VERSION_HEADER: &str = "X-Ubi-Version";

/// Simple case-insensitive header map (keys lowercased)
pub type HeaderMap = HashMap<String, String>;

/// Server response for one request cycle. The body is read at most once.
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Box<dyn Read>,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: Box<dyn Read>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Build a response from borrowed parts; header names are lowercased.
    pub fn from_parts(status: u16, headers: &[(&str, &str)], body: impl Into<Vec<u8>>) -> Self {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        Self::new(status, headers, Box::new(io::Cursor::new(body.into())))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value, treating an empty value as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends one argv to the control plane and returns its response.
pub trait Transport {
    fn send(&mut self, argv: &[String]) -> Result<Response, ProxyError>;
}

#[derive(Serialize)]
struct ArgvBody<'a> {
    argv: &'a [String],
}

/// Encode the request body: `{"argv": [...]}`.
pub fn encode_argv(argv: &[String]) -> Result<Vec<u8>, ProxyError> {
    serde_json::to_vec(&ArgvBody { argv }).map_err(|_| ProxyError::EncodeRequest)
}

/// Authorization value in the form the control plane expects.
pub fn authorization_value(token: &str) -> String {
    format!("Bearer: {token}")
}

/// Blocking HTTP transport backed by reqwest.
pub struct HttpTransport {
    client: Client,
    url: url::Url,
    token: String,
    version: String,
}

impl HttpTransport {
    /// No request deadline: a server-side command may run for as long as it needs.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(None).build()?;
        Ok(Self {
            client,
            url: config.base_url.clone(),
            token: config.token.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, argv: &[String]) -> Result<Response, ProxyError> {
        let body = encode_argv(argv)?;

        let request = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, authorization_value(&self.token))
            .header(VERSION_HEADER, self.version.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/plain")
            .header(CONNECTION, "close")
            .body(body)
            .build()
            .map_err(|e| {
                debug!(error = %e, "request build failed");
                ProxyError::BuildRequest
            })?;

        debug!("sending: {:?}", argv);
        let resp = self.client.execute(request).map_err(|e| {
            debug!(error = %e, "request send failed");
            ProxyError::SendRequest
        })?;

        let status = resp.status().as_u16();
        let mut headers = HeaderMap::new();
        for (name, value) in resp.headers() {
            // Single-valued sentinels: keep the first occurrence.
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        Ok(Response::new(status, headers, Box::new(resp)))
    }
}
