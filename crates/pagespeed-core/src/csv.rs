//! Minimal comma-separated reader and writer.
//!
//! Covers what the URL list and the exported tables need: quoted fields with
//! doubled-quote escapes, separators and newlines inside quotes, and CRLF line
//! endings. Blank lines are dropped when reading.

use std::io::{self, Write};
use std::mem::take;

pub const SEPARATOR: char = ',';

/// Splits `text` into rows of fields.
#[must_use]
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == SEPARATOR && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                push_non_blank(&mut rows, take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    // Flush the trailing row when the text does not end with a newline.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_non_blank(&mut rows, row);
    }

    rows
}

fn push_non_blank(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    let blank = row.iter().all(|f| f.trim().is_empty());
    if !blank {
        rows.push(row);
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes one row, quoting fields that need it.
///
/// # Errors
///
/// Propagates any I/O error from `w`.
pub fn write_row<W, S>(mut w: W, row: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{SEPARATOR}")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}
