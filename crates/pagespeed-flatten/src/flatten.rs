//! Builds flat tables from a completed [`ReportStore`].
//!
//! Rows are laid out by device: with `N` mobile URLs, the mobile row for the
//! i-th URL sits at index `i` and its desktop row at `i + N`. The desktop
//! report is looked up under the same URL; one that was never stored turns
//! into an extraction error for that row. URLs stored only for desktop do not
//! produce rows.

use chrono::{DateTime, TimeZone};
use pagespeed_client::ReportStore;
use pagespeed_core::DeviceType;

use crate::error::{ExtractError, FlattenError};
use crate::extract::{extract_field_record, extract_lab_record};
use crate::schema::TableSchema;
use crate::table::{FetchStamp, FlatRow, FlatTable};

/// What to do with a row whose report cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Replace the row with an all-`Error` row and keep going.
    #[default]
    Sentinel,
    /// Stop at the first bad row.
    Strict,
}

impl ErrorPolicy {
    #[must_use]
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ErrorPolicy::Strict
        } else {
            ErrorPolicy::Sentinel
        }
    }
}

/// Extracts the row for `(url, device)` under `schema`.
///
/// # Errors
///
/// Returns [`ExtractError::MissingReport`] if the store has no report for the
/// pair, or the first path error hit inside the report.
pub fn extract_row(
    store: &ReportStore,
    url: &str,
    device: DeviceType,
    schema: TableSchema,
) -> Result<FlatRow, ExtractError> {
    let report = store
        .get(device, url)
        .ok_or_else(|| ExtractError::MissingReport {
            url: url.to_string(),
            device,
        })?;
    match schema {
        TableSchema::Field(revision) => {
            extract_field_record(report, device, revision).map(FlatRow::Field)
        }
        TableSchema::Lab => extract_lab_record(report, device).map(FlatRow::Lab),
    }
}

/// Flattens `store` into a table with `schema`, stamping every row with
/// `fetched_at`.
///
/// # Errors
///
/// Only under [`ErrorPolicy::Strict`]: returns [`FlattenError::Strict`] for
/// the first row that cannot be extracted.
pub fn flatten<Tz>(
    store: &ReportStore,
    schema: TableSchema,
    fetched_at: &DateTime<Tz>,
    policy: ErrorPolicy,
) -> Result<FlatTable, FlattenError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let urls: Vec<&str> = store.urls(DeviceType::Mobile).collect();
    let mut rows = Vec::with_capacity(urls.len() * DeviceType::ALL.len());

    for device in DeviceType::ALL {
        for url in &urls {
            let row = match extract_row(store, url, device, schema) {
                Ok(row) => row,
                Err(reason) => match policy {
                    ErrorPolicy::Strict => {
                        return Err(FlattenError::Strict {
                            url: (*url).to_string(),
                            device,
                            source: reason,
                        });
                    }
                    ErrorPolicy::Sentinel => {
                        tracing::warn!(
                            url,
                            %device,
                            table = schema.name(),
                            error = %reason,
                            "writing error row"
                        );
                        FlatRow::Error {
                            url: (*url).to_string(),
                            device,
                            reason,
                        }
                    }
                },
            };
            rows.push(row);
        }
    }

    let table = FlatTable::new(schema, FetchStamp::new(fetched_at), rows);
    tracing::info!(
        table = schema.name(),
        rows = table.len(),
        error_rows = table.error_count(),
        "flattened report store"
    );
    Ok(table)
}
