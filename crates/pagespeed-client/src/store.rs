//! In-memory aggregate of raw reports keyed by device and URL.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use pagespeed_core::DeviceType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;

/// Timestamp prefix of persisted response files.
pub const RESPONSE_FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Raw reports grouped as `device → url → report`.
///
/// Each device map keeps first-insertion order of URLs, which downstream
/// tables rely on for row placement. A URL is present only after a
/// successful fetch for that pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportStore {
    #[serde(default)]
    mobile: Map<String, Value>,
    #[serde(default)]
    desktop: Map<String, Value>,
}

impl ReportStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `report` under `[device][url]`, injecting `page_type` into the
    /// document. Re-inserting a URL replaces its report in place.
    pub fn insert(
        &mut self,
        device: DeviceType,
        url: &str,
        mut report: Map<String, Value>,
        page_type: &str,
    ) {
        report.insert("page_type".to_string(), Value::String(page_type.to_string()));
        self.device_map_mut(device)
            .insert(url.to_string(), Value::Object(report));
    }

    #[must_use]
    pub fn get(&self, device: DeviceType, url: &str) -> Option<&Value> {
        self.device_map(device).get(url)
    }

    #[must_use]
    pub fn contains(&self, device: DeviceType, url: &str) -> bool {
        self.device_map(device).contains_key(url)
    }

    /// URLs stored for `device`, in insertion order.
    pub fn urls(&self, device: DeviceType) -> impl Iterator<Item = &str> {
        self.device_map(device).keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self, device: DeviceType) -> usize {
        self.device_map(device).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mobile.is_empty() && self.desktop.is_empty()
    }

    #[must_use]
    pub fn device_map(&self, device: DeviceType) -> &Map<String, Value> {
        match device {
            DeviceType::Mobile => &self.mobile,
            DeviceType::Desktop => &self.desktop,
        }
    }

    fn device_map_mut(&mut self, device: DeviceType) -> &mut Map<String, Value> {
        match device {
            DeviceType::Mobile => &mut self.mobile,
            DeviceType::Desktop => &mut self.desktop,
        }
    }

    /// Writes the whole store as pretty JSON to
    /// `<dir>/<timestamp>-response.json` and returns the path.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::StoreIo`] if the file cannot be written.
    pub fn persist<Tz>(&self, dir: &Path, at: &DateTime<Tz>) -> Result<PathBuf, FetchError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let path = dir.join(response_file_name(at));
        let io_err = |source: std::io::Error| FetchError::StoreIo {
            path: path.display().to_string(),
            source,
        };
        let json = serde_json::to_vec_pretty(self).map_err(|e| io_err(e.into()))?;
        std::fs::write(&path, json).map_err(io_err)?;
        tracing::info!(
            path = %path.display(),
            mobile = self.mobile.len(),
            desktop = self.desktop.len(),
            "persisted report store"
        );
        Ok(path)
    }

    /// Reads a store previously written by [`ReportStore::persist`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::StoreIo`] if the file cannot be read, or
    /// [`FetchError::Deserialize`] if it is not a store document.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path).map_err(|e| FetchError::StoreIo {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| FetchError::Deserialize {
            context: path.display().to_string(),
            source: e,
        })
    }
}

/// File name of the persisted store for a run started at `at`.
#[must_use]
pub fn response_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}-response.json", at.format(RESPONSE_FILE_TIME_FORMAT))
}
