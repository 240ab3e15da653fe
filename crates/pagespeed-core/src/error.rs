use thiserror::Error;

/// Errors raised while loading the run configuration or the URL list.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ConfigFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to read URL file {path}: {source}")]
    UrlFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("URL file {path} is missing required column \"{column}\"")]
    MissingColumn { path: String, column: String },

    #[error("URL file {path}, row {row}: {reason}")]
    InvalidRow {
        path: String,
        row: usize,
        reason: String,
    },

    #[error("invalid device type \"{0}\" (expected \"mobile\" or \"desktop\")")]
    InvalidDeviceType(String),
}
