use pagespeed_core::DeviceType;
use thiserror::Error;

/// Why a single row could not be extracted from its report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no {device} report stored for {url}")]
    MissingReport { url: String, device: DeviceType },

    #[error("missing field {path}")]
    MissingField { path: String },

    #[error("field {path} is not {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },

    #[error("index {index} out of range for {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Error)]
pub enum FlattenError {
    /// Raised under [`crate::ErrorPolicy::Strict`] for the first bad row.
    #[error("{device} row for {url} could not be extracted: {source}")]
    Strict {
        url: String,
        device: DeviceType,
        #[source]
        source: ExtractError,
    },

    #[error("failed to write table to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
