//! Flat rows and tables, and their CSV rendering.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, TimeZone};
use pagespeed_core::{csv, DeviceType, FieldRevision};
use serde_json::Number;

use crate::error::{ExtractError, FlattenError};
use crate::schema::TableSchema;
use crate::types::{FieldMetric, FieldRecord, LabRecord};

/// Value written to every column of a row whose report could not be read.
pub const ERROR_SENTINEL: &str = "Error";

pub const FETCH_TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
pub const FETCH_DATE_FORMAT: &str = "%Y%m%d";

/// One rendered table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(Number),
    Empty,
}

impl Cell {
    fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    fn number(n: &Number) -> Self {
        Cell::Number(n.clone())
    }

    fn optional(n: Option<&Number>) -> Self {
        n.map_or(Cell::Empty, Cell::number)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Empty => Ok(()),
        }
    }
}

/// `fetch_time` / `fetch_date` column values shared by every row of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStamp {
    pub fetch_time: String,
    /// Compact `YYYYMMDD` form that reporting tools read as a date.
    pub fetch_date: String,
}

impl FetchStamp {
    #[must_use]
    pub fn new<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            fetch_time: at.format(FETCH_TIME_FORMAT).to_string(),
            fetch_date: at.format(FETCH_DATE_FORMAT).to_string(),
        }
    }
}

/// One url/device observation, or the marker left where extraction failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatRow {
    Field(FieldRecord),
    Lab(LabRecord),
    Error {
        url: String,
        device: DeviceType,
        reason: ExtractError,
    },
}

impl FlatRow {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, FlatRow::Error { .. })
    }

    /// Device the row was built for, including error rows.
    #[must_use]
    pub fn device(&self) -> DeviceType {
        match self {
            FlatRow::Field(r) => r.device_type,
            FlatRow::Lab(r) => r.device_type,
            FlatRow::Error { device, .. } => *device,
        }
    }

    /// Renders the row in `schema` column order. Error rows render
    /// [`ERROR_SENTINEL`] in every column.
    #[must_use]
    pub fn cells(&self, schema: TableSchema, stamp: &FetchStamp) -> Vec<Cell> {
        match self {
            FlatRow::Field(rec) => field_cells(rec, schema, stamp),
            FlatRow::Lab(rec) => lab_cells(rec, stamp),
            FlatRow::Error { .. } => vec![Cell::text(ERROR_SENTINEL); schema.columns().len()],
        }
    }
}

fn metric_cells(metric: Option<&FieldMetric>) -> [Cell; 2] {
    match metric {
        Some(m) => [Cell::number(&m.percentile), Cell::text(&m.category)],
        None => [Cell::Empty, Cell::Empty],
    }
}

fn distribution_cells(metric: Option<&FieldMetric>) -> [Cell; 3] {
    match metric {
        Some(m) => [
            Cell::number(&m.distribution.fast),
            Cell::number(&m.distribution.average),
            Cell::number(&m.distribution.slow),
        ],
        None => [Cell::Empty, Cell::Empty, Cell::Empty],
    }
}

fn field_cells(rec: &FieldRecord, schema: TableSchema, stamp: &FetchStamp) -> Vec<Cell> {
    let fcp = Some(&rec.first_contentful_paint);
    let mut cells = vec![
        Cell::text(&rec.requested_url),
        Cell::text(&rec.final_url),
        Cell::text(rec.device_type.as_str()),
    ];
    cells.extend(metric_cells(fcp));

    if schema == TableSchema::Field(FieldRevision::Full) {
        let fid = rec.first_input_delay.as_ref();
        cells.extend(metric_cells(fid));
        cells.push(rec.overall_category.as_deref().map_or(Cell::Empty, Cell::text));
        cells.extend(distribution_cells(fid));
    }
    cells.extend(distribution_cells(fcp));

    cells.extend([
        Cell::text(&rec.page_type),
        Cell::text(&stamp.fetch_time),
        Cell::text(&stamp.fetch_date),
    ]);
    cells
}

fn lab_cells(rec: &LabRecord, stamp: &FetchStamp) -> Vec<Cell> {
    vec![
        Cell::text(&rec.requested_url),
        Cell::text(&rec.final_url),
        Cell::text(rec.device_type.as_str()),
        Cell::text(&stamp.fetch_time),
        Cell::optional(rec.overall_speed_score.as_ref()),
        Cell::optional(rec.first_contentful_paint.as_ref()),
        Cell::optional(rec.first_meaningful_paint.as_ref()),
        Cell::optional(rec.speed_index.as_ref()),
        Cell::optional(rec.first_cpu_idle.as_ref()),
        Cell::optional(rec.time_to_interactive.as_ref()),
        Cell::optional(rec.estimated_input_latency.as_ref()),
        Cell::text(&stamp.fetch_date),
        Cell::text(&rec.page_type),
    ]
}

/// Ordered rows sharing one schema. Row `i` is addressed by its position;
/// there are no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    schema: TableSchema,
    stamp: FetchStamp,
    rows: Vec<FlatRow>,
}

impl FlatTable {
    #[must_use]
    pub fn new(schema: TableSchema, stamp: FetchStamp, rows: Vec<FlatRow>) -> Self {
        Self {
            schema,
            stamp,
            rows,
        }
    }

    #[must_use]
    pub fn schema(&self) -> TableSchema {
        self.schema
    }

    #[must_use]
    pub fn columns(&self) -> &'static [&'static str] {
        self.schema.columns()
    }

    #[must_use]
    pub fn stamp(&self) -> &FetchStamp {
        &self.stamp
    }

    #[must_use]
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_error()).count()
    }

    /// Cells of row `index`, or `None` past the end.
    #[must_use]
    pub fn row_cells(&self, index: usize) -> Option<Vec<Cell>> {
        self.rows
            .get(index)
            .map(|r| r.cells(self.schema, &self.stamp))
    }

    /// Writes a header line followed by one line per row.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from `w`.
    pub fn write_csv<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        csv::write_row(&mut w, self.columns())?;
        for row in &self.rows {
            let cells: Vec<String> = row
                .cells(self.schema, &self.stamp)
                .iter()
                .map(ToString::to_string)
                .collect();
            csv::write_row(&mut w, &cells)?;
        }
        w.flush()
    }

    /// Writes the table as CSV to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`FlattenError::Io`] if the file cannot be created or written.
    pub fn save_csv(&self, path: &Path) -> Result<(), FlattenError> {
        let io_err = |source: std::io::Error| FlattenError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = std::fs::File::create(path).map_err(io_err)?;
        self.write_csv(std::io::BufWriter::new(file)).map_err(io_err)?;
        tracing::info!(
            path = %path.display(),
            table = self.schema.name(),
            rows = self.rows.len(),
            error_rows = self.error_count(),
            "wrote table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pagespeed_core::FieldRevision;

    use super::*;
    use crate::extract::{extract_field_record, extract_lab_record};
    use crate::fixtures::report;

    fn stamp() -> FetchStamp {
        FetchStamp::new(&Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap())
    }

    fn rendered(row: &FlatRow, schema: TableSchema) -> Vec<String> {
        row.cells(schema, &stamp())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn stamp_formats_time_and_date() {
        let s = stamp();
        assert_eq!(s.fetch_time, "2024-03-09_14:05:07");
        assert_eq!(s.fetch_date, "20240309");
    }

    #[test]
    fn full_field_row_matches_column_order() {
        let schema = TableSchema::Field(FieldRevision::Full);
        let rec = extract_field_record(
            &report("https://a.test/", "home"),
            DeviceType::Mobile,
            FieldRevision::Full,
        )
        .unwrap();
        let cells = rendered(&FlatRow::Field(rec), schema);
        assert_eq!(cells.len(), schema.columns().len());
        assert_eq!(
            cells,
            [
                "https://a.test/",
                "https://a.test/final",
                "mobile",
                "1450",
                "FAST",
                "32",
                "AVERAGE",
                "AVERAGE",
                "0.7",
                "0.2",
                "0.1",
                "0.81",
                "0.12",
                "0.07",
                "home",
                "2024-03-09_14:05:07",
                "20240309",
            ]
        );
    }

    #[test]
    fn basic_field_row_matches_column_order() {
        let schema = TableSchema::Field(FieldRevision::Basic);
        let rec = extract_field_record(
            &report("https://a.test/", "home"),
            DeviceType::Desktop,
            FieldRevision::Basic,
        )
        .unwrap();
        let cells = rendered(&FlatRow::Field(rec), schema);
        assert_eq!(
            cells,
            [
                "https://a.test/",
                "https://a.test/final",
                "desktop",
                "1450",
                "FAST",
                "0.81",
                "0.12",
                "0.07",
                "home",
                "2024-03-09_14:05:07",
                "20240309",
            ]
        );
    }

    #[test]
    fn lab_row_matches_column_order_with_empty_null_score() {
        let rec = extract_lab_record(&report("https://b.test/", "product"), DeviceType::Mobile)
            .unwrap();
        let cells = rendered(&FlatRow::Lab(rec), TableSchema::Lab);
        assert_eq!(
            cells,
            [
                "https://b.test/",
                "https://b.test/final",
                "mobile",
                "2024-03-09_14:05:07",
                "0.91",
                "0.98",
                "0.97",
                "0.88",
                "0.9",
                "0.85",
                "",
                "20240309",
                "product",
            ]
        );
    }

    #[test]
    fn error_row_is_sentinel_in_every_column() {
        let row = FlatRow::Error {
            url: "https://a.test/".to_string(),
            device: DeviceType::Desktop,
            reason: ExtractError::MissingField {
                path: "loadingExperience".to_string(),
            },
        };
        for schema in [
            TableSchema::Field(FieldRevision::Full),
            TableSchema::Field(FieldRevision::Basic),
            TableSchema::Lab,
        ] {
            let cells = rendered(&row, schema);
            assert_eq!(cells.len(), schema.columns().len());
            assert!(cells.iter().all(|c| c == ERROR_SENTINEL));
        }
        assert_eq!(row.device(), DeviceType::Desktop);
    }

    #[test]
    fn write_csv_emits_header_and_rows() {
        let rec = extract_lab_record(&report("https://b.test/", "product"), DeviceType::Mobile)
            .unwrap();
        let table = FlatTable::new(
            TableSchema::Lab,
            stamp(),
            vec![
                FlatRow::Lab(rec),
                FlatRow::Error {
                    url: "https://c.test/".to_string(),
                    device: DeviceType::Desktop,
                    reason: ExtractError::MissingReport {
                        url: "https://c.test/".to_string(),
                        device: DeviceType::Desktop,
                    },
                },
            ],
        );
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("requested_url,final_url,device_type,fetch_time,"));
        assert!(lines[1].starts_with("https://b.test/,https://b.test/final,mobile,"));
        assert_eq!(lines[2], vec![ERROR_SENTINEL; 13].join(","));
        assert_eq!(table.error_count(), 1);
    }
}
