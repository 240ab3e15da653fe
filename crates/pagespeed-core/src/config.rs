//! Run configuration: a JSON file plus environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_SERVER_ERROR_BACKOFF_SECS: u64 = 5;
const DEFAULT_OTHER_ERROR_BACKOFF_SECS: u64 = 3600;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Which field-data table layout to produce.
///
/// `Basic` carries first contentful paint only. `Full` adds first input delay
/// and the overall category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRevision {
    Basic,
    #[default]
    Full,
}

/// On-disk shape of the config file. Unknown keys are ignored so the same
/// file can carry settings for downstream sinks.
#[derive(Debug, Deserialize)]
struct RunConfigFile {
    url_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    api_key: Option<String>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    server_error_backoff_secs: Option<u64>,
    other_error_backoff_secs: Option<u64>,
    field_revision: Option<FieldRevision>,
    strict: Option<bool>,
    log_level: Option<String>,
}

#[derive(Clone)]
pub struct RunConfig {
    pub url_file: PathBuf,
    pub output_dir: PathBuf,
    pub api_key: Option<String>,
    /// Overrides the public `PageSpeed` endpoint; used to point at mock servers.
    pub base_url: Option<String>,
    /// `None` leaves the transport default in place.
    pub request_timeout_secs: Option<u64>,
    pub max_attempts: u32,
    pub server_error_backoff_secs: u64,
    pub other_error_backoff_secs: u64,
    pub field_revision: FieldRevision,
    /// Abort flattening on the first malformed report instead of writing an
    /// `Error` row.
    pub strict: bool,
    pub log_level: String,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("url_file", &self.url_file)
            .field("output_dir", &self.output_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("server_error_backoff_secs", &self.server_error_backoff_secs)
            .field("other_error_backoff_secs", &self.other_error_backoff_secs)
            .field("field_revision", &self.field_revision)
            .field("strict", &self.strict)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Load the run configuration from `path`, applying overrides from the
/// process environment.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, `url_file` is
/// missing, or a value is invalid.
pub fn load_run_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_run_config(&content, &path.display().to_string(), std::env::var)
}

/// Parse config JSON, resolving environment overrides through `lookup`.
///
/// Decoupled from the real environment so tests can pass a map-backed lookup.
/// Keys passed to `lookup` are the fixed `PAGESPEED_*` variable names.
///
/// # Errors
///
/// Returns `ConfigError` on malformed JSON, a missing `url_file`, or an
/// invalid value.
pub fn parse_run_config<F>(content: &str, source: &str, lookup: F) -> Result<RunConfig, ConfigError>
where
    F: Fn(&'static str) -> Result<String, std::env::VarError>,
{
    let file: RunConfigFile =
        serde_json::from_str(content).map_err(|e| ConfigError::ConfigFileParse {
            path: source.to_string(),
            source: e,
        })?;
    build_run_config(file, lookup)
}

fn build_run_config<F>(file: RunConfigFile, lookup: F) -> Result<RunConfig, ConfigError>
where
    F: Fn(&'static str) -> Result<String, std::env::VarError>,
{
    let env = |var: &'static str| lookup(var).ok().filter(|v| !v.trim().is_empty());

    let parse_u32 = |var: &'static str| -> Result<Option<u32>, ConfigError> {
        env(var)
            .map(|raw| {
                raw.trim().parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    };

    let url_file = file.url_file.ok_or_else(|| ConfigError::InvalidValue {
        field: "url_file".to_string(),
        reason: "required key is missing".to_string(),
    })?;

    let output_dir = env("PAGESPEED_OUTPUT_DIR")
        .map(PathBuf::from)
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let api_key = env("PAGESPEED_API_KEY").or(file.api_key);
    let base_url = env("PAGESPEED_BASE_URL").or(file.base_url);

    let max_attempts = parse_u32("PAGESPEED_MAX_ATTEMPTS")?
        .or(file.max_attempts)
        .unwrap_or(DEFAULT_MAX_ATTEMPTS);
    if max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            field: "max_attempts".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(RunConfig {
        url_file,
        output_dir,
        api_key,
        base_url,
        request_timeout_secs: file.request_timeout_secs,
        max_attempts,
        server_error_backoff_secs: file
            .server_error_backoff_secs
            .unwrap_or(DEFAULT_SERVER_ERROR_BACKOFF_SECS),
        other_error_backoff_secs: file
            .other_error_backoff_secs
            .unwrap_or(DEFAULT_OTHER_ERROR_BACKOFF_SECS),
        field_revision: file.field_revision.unwrap_or_default(),
        strict: file.strict.unwrap_or(false),
        log_level: file
            .log_level
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    })
}
