//! Path lookups into a raw report, producing typed records.
//!
//! Every lookup either yields the value or an [`ExtractError`] naming the
//! dotted path that failed, so a bad row can be explained in logs.

use pagespeed_core::{DeviceType, FieldRevision};
use serde_json::{Number, Value};

use crate::error::ExtractError;
use crate::types::{Distribution, FieldMetric, FieldRecord, LabRecord};

const FIRST_CONTENTFUL_PAINT: &str = "FIRST_CONTENTFUL_PAINT_MS";
const FIRST_INPUT_DELAY: &str = "FIRST_INPUT_DELAY_MS";

/// A position inside a report plus the path that led there.
#[derive(Clone)]
struct Cursor<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Cursor<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    fn key(&self, key: &str) -> Result<Cursor<'a>, ExtractError> {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        };
        let object = self.value.as_object().ok_or_else(|| ExtractError::WrongType {
            path: self.display_path(),
            expected: "an object",
        })?;
        let value = object
            .get(key)
            .ok_or_else(|| ExtractError::MissingField { path: path.clone() })?;
        Ok(Cursor { value, path })
    }

    fn index(&self, index: usize) -> Result<Cursor<'a>, ExtractError> {
        let items = self.value.as_array().ok_or_else(|| ExtractError::WrongType {
            path: self.display_path(),
            expected: "an array",
        })?;
        let value = items.get(index).ok_or_else(|| ExtractError::IndexOutOfRange {
            path: self.display_path(),
            index,
            len: items.len(),
        })?;
        Ok(Cursor {
            value,
            path: format!("{}[{index}]", self.path),
        })
    }

    fn path(&self, keys: &[&str]) -> Result<Cursor<'a>, ExtractError> {
        keys.iter().try_fold(self.clone(), |cur, k| cur.key(k))
    }

    fn string(&self) -> Result<String, ExtractError> {
        self.value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.wrong_type("a string"))
    }

    fn number(&self) -> Result<Number, ExtractError> {
        match self.value {
            Value::Number(n) => Ok(n.clone()),
            _ => Err(self.wrong_type("a number")),
        }
    }

    fn nullable_number(&self) -> Result<Option<Number>, ExtractError> {
        match self.value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(n.clone())),
            _ => Err(self.wrong_type("a number or null")),
        }
    }

    fn wrong_type(&self, expected: &'static str) -> ExtractError {
        ExtractError::WrongType {
            path: self.display_path(),
            expected,
        }
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "<report>".to_string()
        } else {
            self.path.clone()
        }
    }
}

fn field_metric(metrics: &Cursor<'_>, name: &str) -> Result<FieldMetric, ExtractError> {
    let metric = metrics.key(name)?;
    let buckets = metric.key("distributions")?;
    let proportion = |i: usize| buckets.index(i)?.key("proportion")?.number();

    Ok(FieldMetric {
        percentile: metric.key("percentile")?.number()?,
        category: metric.key("category")?.string()?,
        distribution: Distribution {
            fast: proportion(0)?,
            average: proportion(1)?,
            slow: proportion(2)?,
        },
    })
}

fn audit_score(audits: &Cursor<'_>, audit: &str) -> Result<Option<Number>, ExtractError> {
    audits.path(&[audit, "score"])?.nullable_number()
}

/// Reads the field-data record for `revision` out of one report.
///
/// # Errors
///
/// Returns the first [`ExtractError`] hit while walking the report.
pub fn extract_field_record(
    report: &Value,
    device: DeviceType,
    revision: FieldRevision,
) -> Result<FieldRecord, ExtractError> {
    let root = Cursor::root(report);
    let lighthouse = root.key("lighthouseResult")?;
    let experience = root.key("loadingExperience")?;
    let metrics = experience.key("metrics")?;

    let (first_input_delay, overall_category) = match revision {
        FieldRevision::Basic => (None, None),
        FieldRevision::Full => (
            Some(field_metric(&metrics, FIRST_INPUT_DELAY)?),
            Some(experience.key("overall_category")?.string()?),
        ),
    };

    Ok(FieldRecord {
        requested_url: lighthouse.key("requestedUrl")?.string()?,
        final_url: lighthouse.key("finalUrl")?.string()?,
        device_type: device,
        first_contentful_paint: field_metric(&metrics, FIRST_CONTENTFUL_PAINT)?,
        first_input_delay,
        overall_category,
        page_type: root.key("page_type")?.string()?,
    })
}

/// Reads the lab-data record out of one report.
///
/// # Errors
///
/// Returns the first [`ExtractError`] hit while walking the report.
pub fn extract_lab_record(report: &Value, device: DeviceType) -> Result<LabRecord, ExtractError> {
    let root = Cursor::root(report);
    let lighthouse = root.key("lighthouseResult")?;
    let audits = lighthouse.key("audits")?;

    Ok(LabRecord {
        requested_url: lighthouse.key("requestedUrl")?.string()?,
        final_url: lighthouse.key("finalUrl")?.string()?,
        device_type: device,
        page_type: root.key("page_type")?.string()?,
        overall_speed_score: lighthouse
            .path(&["categories", "performance", "score"])?
            .nullable_number()?,
        first_contentful_paint: audit_score(&audits, "first-contentful-paint")?,
        first_meaningful_paint: audit_score(&audits, "first-meaningful-paint")?,
        speed_index: audit_score(&audits, "speed-index")?,
        first_cpu_idle: audit_score(&audits, "first-cpu-idle")?,
        time_to_interactive: audit_score(&audits, "interactive")?,
        estimated_input_latency: audit_score(&audits, "estimated-input-latency")?,
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
