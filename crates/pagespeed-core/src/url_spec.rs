use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::csv::parse_rows;
use crate::{ConfigError, DeviceType};

const URL_COLUMN: &str = "URL";
const DEVICE_COLUMN: &str = "device_type";
const PAGE_TYPE_COLUMN: &str = "page_type";

/// One site/device combination to measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSpec {
    pub url: String,
    pub device_type: DeviceType,
    pub page_type: String,
}

/// Load the URL list from a CSV file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, lacks one of the
/// `URL`, `device_type` or `page_type` columns, or has an invalid row.
pub fn load_url_specs(path: &Path) -> Result<Vec<UrlSpec>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::UrlFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let specs = parse_url_specs(&content, &path.display().to_string())?;
    tracing::info!(path = %path.display(), count = specs.len(), "loaded URL list");
    Ok(specs)
}

/// Parse URL-list CSV text. `source` names the input in error messages.
///
/// Columns are located by header name, so their order does not matter and
/// extra columns are ignored.
///
/// # Errors
///
/// Returns `ConfigError::MissingColumn` or `ConfigError::InvalidRow`.
pub fn parse_url_specs(content: &str, source: &str) -> Result<Vec<UrlSpec>, ConfigError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut rows = parse_rows(content).into_iter();
    let header = rows.next().unwrap_or_default();

    let column = |name: &str| -> Result<usize, ConfigError> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ConfigError::MissingColumn {
                path: source.to_string(),
                column: name.to_string(),
            })
    };
    let url_idx = column(URL_COLUMN)?;
    let device_idx = column(DEVICE_COLUMN)?;
    let page_idx = column(PAGE_TYPE_COLUMN)?;

    rows.enumerate()
        .map(|(i, row)| {
            let row_no = i + 1;
            let invalid = |reason: String| ConfigError::InvalidRow {
                path: source.to_string(),
                row: row_no,
                reason,
            };
            let cell = |idx: usize| row.get(idx).map_or("", |s| s.trim());

            let url = cell(url_idx);
            if url.is_empty() {
                return Err(invalid("empty URL".to_string()));
            }
            let device_type = cell(device_idx)
                .parse::<DeviceType>()
                .map_err(|e| invalid(e.to_string()))?;

            Ok(UrlSpec {
                url: url.to_string(),
                device_type,
                page_type: cell(page_idx).to_string(),
            })
        })
        .collect()
}
