use pagespeed_core::FieldRevision;

const FIELD_FULL_COLUMNS: &[&str] = &[
    "requested_url",
    "final_url",
    "device_type",
    "first_contentful_paint_ms",
    "first_contentful_paint_cat",
    "first_input_delay_ms",
    "first_input_delay_cat",
    "overall_category",
    "pct_first_input_delay_ms_fast",
    "pct_first_input_delay_ms_average",
    "pct_first_input_delay_ms_slow",
    "pct_first_contentful_paint_fast",
    "pct_first_contentful_paint_average",
    "pct_first_contentful_paint_slow",
    "page_type",
    "fetch_time",
    "fetch_date",
];

const FIELD_BASIC_COLUMNS: &[&str] = &[
    "requested_url",
    "final_url",
    "device_type",
    "first_contentful_paint_ms",
    "first_contentful_paint_cat",
    "pct_first_contentful_paint_fast",
    "pct_first_contentful_paint_average",
    "pct_first_contentful_paint_slow",
    "page_type",
    "fetch_time",
    "fetch_date",
];

const LAB_COLUMNS: &[&str] = &[
    "requested_url",
    "final_url",
    "device_type",
    "fetch_time",
    "overall_speed_score",
    "first_contentful_paint",
    "first_meaningful_paint",
    "speed_index",
    "first_cpu_idle",
    "time_to_interactive",
    "estimated_input_latency",
    "fetch_date",
    "page_type",
];

/// Layout of a flattened table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSchema {
    /// Real-user metrics from `loadingExperience`.
    Field(FieldRevision),
    /// Lighthouse audit scores from `lighthouseResult`.
    Lab,
}

impl TableSchema {
    #[must_use]
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableSchema::Field(FieldRevision::Full) => FIELD_FULL_COLUMNS,
            TableSchema::Field(FieldRevision::Basic) => FIELD_BASIC_COLUMNS,
            TableSchema::Lab => LAB_COLUMNS,
        }
    }

    /// Short name used in output file names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TableSchema::Field(_) => "field",
            TableSchema::Lab => "lab",
        }
    }
}
