//! HTTP client for the `PageSpeed` Insights `runPagespeed` endpoint.
//!
//! Wraps `reqwest` with endpoint construction, optional API key handling and
//! error classification. Every successful call yields the report as a JSON
//! object; anything else is surfaced as a [`FetchError`].

use std::future::Future;
use std::time::Duration;

use pagespeed_core::DeviceType;
use reqwest::{Client, Url};
use serde_json::{Map, Value};

use crate::error::FetchError;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/";
const ENDPOINT: &str = "runPagespeed";
const USER_AGENT: &str = "pagespeed-cli/0.1 (performance-tracking)";

/// Longest slice of a non-JSON error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Something that can produce one raw report per `(url, device)` pair.
///
/// [`PageSpeedClient`] is the production source; tests substitute scripted
/// sources to drive the retry loop.
pub trait ReportSource {
    fn fetch_report(
        &self,
        url: &str,
        device: DeviceType,
    ) -> impl Future<Output = Result<Map<String, Value>, FetchError>>;
}

/// Client for the `PageSpeed` Insights API.
///
/// Use [`PageSpeedClient::new`] for production or
/// [`PageSpeedClient::with_base_url`] to point at a mock server in tests.
pub struct PageSpeedClient {
    client: Client,
    api_key: Option<String>,
    endpoint: Url,
}

impl PageSpeedClient {
    /// Creates a client pointed at the public `PageSpeed` API.
    ///
    /// `timeout_secs = None` keeps the transport's default (no overall
    /// request timeout).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: Option<&str>, timeout_secs: Option<u64>) -> Result<Self, FetchError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FetchError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: Option<&str>,
        timeout_secs: Option<u64>,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        // Exactly one trailing slash, so joining the endpoint appends a path
        // segment instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(ENDPOINT))
            .map_err(|e| FetchError::InvalidBaseUrl {
                base_url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.map(str::to_owned),
            endpoint,
        })
    }

    /// Runs one `PageSpeed` analysis of `url` with the given device strategy.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] on network failure.
    /// - [`FetchError::Status`] on a non-2xx response.
    /// - [`FetchError::Api`] if a 2xx body carries an `error` object.
    /// - [`FetchError::Deserialize`] if the body is not a JSON object.
    pub async fn run_pagespeed(
        &self,
        url: &str,
        device: DeviceType,
    ) -> Result<Map<String, Value>, FetchError> {
        let request_url = self.build_url(url, device);
        let response = self.client.get(request_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                target: url.to_string(),
                message: error_message(&body),
            });
        }

        let report: Map<String, Value> =
            serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
                context: format!("runPagespeed(url={url}, strategy={device})"),
                source: e,
            })?;

        if let Some(err) = report.get("error") {
            return Err(FetchError::Api(
                api_error_message(err).unwrap_or_else(|| err.to_string()),
            ));
        }

        Ok(report)
    }

    /// Builds the request URL, percent-encoding the target URL and strategy
    /// through [`Url::query_pairs_mut`].
    fn build_url(&self, url: &str, device: DeviceType) -> Url {
        let mut request_url = self.endpoint.clone();
        {
            let mut pairs = request_url.query_pairs_mut();
            pairs.append_pair("url", url);
            pairs.append_pair("strategy", device.as_str());
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        request_url
    }
}

impl ReportSource for PageSpeedClient {
    fn fetch_report(
        &self,
        url: &str,
        device: DeviceType,
    ) -> impl Future<Output = Result<Map<String, Value>, FetchError>> {
        self.run_pagespeed(url, device)
    }
}

fn api_error_message(err: &Value) -> Option<String> {
    err.get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Extracts a readable message from an error response body: the API's
/// `error.message` when present, otherwise a prefix of the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(api_error_message))
        .unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect())
}
