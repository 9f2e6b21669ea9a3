//! Request building, execution and response decoding for the Honeycomb API.
//!
//! # Design
//! `Client` holds an immutable `Config` and a `ureq::Agent`. Each call is
//! split into three steps that resources chain together:
//!
//! - `request` / `json_request` build an `HttpRequest` (pure).
//! - `execute` performs exactly one HTTP round trip.
//! - `parse_response` / `parse_empty` decode an `HttpResponse` or map it to
//!   an `ApiError` (pure).
//!
//! Nothing is cached and nothing is retried.

use std::fmt;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::board::Boards;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::marker::Markers;
use crate::trigger::Triggers;

pub(crate) const API_KEY_HEADER: &str = "x-honeycomb-team";

/// Everything except RFC 3986 unreserved characters is escaped in a segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Largest response body `execute` will read. ureq stops at 10 MiB by default,
/// which a long marker list can exceed.
pub(crate) const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

/// Synchronous client for the Honeycomb REST API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    config: Config,
    agent: ureq::Agent,
}

impl Client {
    /// Create a client, rejecting empty credentials and unusable base URLs.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        validate_url(config.api_url())?;

        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();

        Ok(Self { config, agent })
    }

    /// Create a client from the `HONEYCOMBIO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &str {
        self.config.dataset()
    }

    /// Return a client whose requests carry `timeout` as their deadline.
    ///
    /// The returned client shares this client's agent.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            config: self.config.clone().with_timeout(timeout),
            agent: self.agent.clone(),
        }
    }

    pub fn markers(&self) -> Markers<'_> {
        Markers::new(self)
    }

    pub fn triggers(&self) -> Triggers<'_> {
        Triggers::new(self)
    }

    pub fn boards(&self) -> Boards<'_> {
        Boards::new(self)
    }

    /// Build a request without a body.
    ///
    /// `path` must start with `/` and is appended to the configured base URL.
    pub fn request(&self, method: HttpMethod, path: &str) -> Result<HttpRequest> {
        let url = self.url_for(path)?;
        Ok(HttpRequest {
            method,
            url,
            headers: self.default_headers(),
            body: None,
        })
    }

    /// Build a request carrying `payload` serialized as JSON.
    pub fn json_request<B>(&self, method: HttpMethod, path: &str, payload: &B) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.request(method, path)?;
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        Ok(request)
    }

    /// Perform one HTTP round trip.
    ///
    /// Non-success statuses are returned as data; only failures to obtain a
    /// complete response are errors here.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        debug!(%method, %url, "sending request");
        if let Some(body) = &body {
            trace!(%body, "request body");
        }

        let result = match (method, body) {
            (HttpMethod::Get, _) => self.prepare(self.agent.get(&url), &headers).call(),
            (HttpMethod::Delete, _) => self.prepare(self.agent.delete(&url), &headers).call(),
            (HttpMethod::Post, Some(body)) => self.prepare(self.agent.post(&url), &headers).send(body.as_bytes()),
            (HttpMethod::Post, None) => self.prepare(self.agent.post(&url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => self.prepare(self.agent.put(&url), &headers).send(body.as_bytes()),
            (HttpMethod::Put, None) => self.prepare(self.agent.put(&url), &headers).send_empty(),
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()
            .map_err(transport_error)?;

        debug!(status, %url, "received response");
        trace!(%body, "response body");

        Ok(HttpResponse { status, headers, body })
    }

    /// Decode a success body into `T`, or map a failure status to an error.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Accept any success status and ignore the body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    pub fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self.execute(request)?;
        self.parse_response(response)
    }

    pub fn send_empty(&self, request: HttpRequest) -> Result<()> {
        let response = self.execute(request)?;
        self.parse_empty(response)
    }

    fn url_for(&self, path: &str) -> Result<String> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidUrl(format!("path {path:?} must start with '/'")));
        }
        let url = format!("{}{path}", self.config.api_url());
        validate_url(&url)?;
        Ok(url)
    }

    fn default_headers(&self) -> Vec<(String, String)> {
        vec![
            (API_KEY_HEADER.to_string(), self.config.api_key().to_string()),
            ("user-agent".to_string(), self.config.user_agent().to_string()),
        ]
    }

    fn prepare<B>(&self, mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match self.config.timeout() {
            Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
            None => builder,
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Escape a dataset name or resource id for use as a single path segment.
pub(crate) fn path_segment(segment: &str) -> PercentEncode<'_> {
    utf8_percent_encode(segment, PATH_SEGMENT)
}

fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ApiError::from_response(response))
    }
}

/// Require an absolute `http` or `https` address.
fn validate_url(url: &str) -> Result<()> {
    let uri: ureq::http::Uri = url
        .parse()
        .map_err(|e: ureq::http::uri::InvalidUri| ApiError::InvalidUrl(format!("{url:?}: {e}")))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => return Err(ApiError::InvalidUrl(format!("{url:?}: scheme must be http or https"))),
    }
    if uri.authority().is_none() {
        return Err(ApiError::InvalidUrl(format!("{url:?}: missing host")));
    }
    Ok(())
}

fn transport_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout,
        other => ApiError::Transport(other.to_string()),
    }
}
