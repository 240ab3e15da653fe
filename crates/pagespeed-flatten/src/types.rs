//! Typed views of the report fields that make up each table row.

use pagespeed_core::DeviceType;
use serde_json::Number;

/// Share of real-user sessions per bucket, read from the three-element
/// `distributions` array in fast, average, slow order.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub fast: Number,
    pub average: Number,
    pub slow: Number,
}

/// One field-data metric such as `FIRST_CONTENTFUL_PAINT_MS`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetric {
    /// p75 value in milliseconds.
    pub percentile: Number,
    /// Bucket label, e.g. `FAST`.
    pub category: String,
    pub distribution: Distribution,
}

/// Field-data row. `first_input_delay` and `overall_category` are only
/// populated for the full revision.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub requested_url: String,
    pub final_url: String,
    pub device_type: DeviceType,
    pub first_contentful_paint: FieldMetric,
    pub first_input_delay: Option<FieldMetric>,
    pub overall_category: Option<String>,
    pub page_type: String,
}

/// Lab-data row. Lighthouse reports a `null` score for audits it could not
/// complete, hence the options.
#[derive(Debug, Clone, PartialEq)]
pub struct LabRecord {
    pub requested_url: String,
    pub final_url: String,
    pub device_type: DeviceType,
    pub page_type: String,
    pub overall_speed_score: Option<Number>,
    pub first_contentful_paint: Option<Number>,
    pub first_meaningful_paint: Option<Number>,
    pub speed_index: Option<Number>,
    pub first_cpu_idle: Option<Number>,
    pub time_to_interactive: Option<Number>,
    pub estimated_input_latency: Option<Number>,
}
