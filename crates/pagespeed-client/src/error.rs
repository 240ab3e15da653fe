use thiserror::Error;

/// Errors returned while fetching, storing or reloading `PageSpeed` reports.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status. `status` displays with its
    /// canonical reason, e.g. `500 Internal Server Error`.
    #[error("unexpected HTTP status {status} for {target}: {message}")]
    Status {
        status: reqwest::StatusCode,
        target: String,
        message: String,
    },

    /// A 2xx response whose body carries an `error` object.
    #[error("PageSpeed API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into a JSON object.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("report store I/O error for {path}: {source}")]
    StoreIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
