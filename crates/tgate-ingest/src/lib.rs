//! Read benchmark result tables into tgate records.
//!
//! The input is the CSV that GNU parallel writes with `--results file.csv`:
//! a header row, then one row per job. Only the events and runtime columns
//! are read; every other column (`Seq`, `Host`, `Command`, `Stderr`, ...) is
//! skipped. Captured stdout is stored quoted and usually ends in a newline,
//! so numeric cells are trimmed before parsing.

use std::fs;
use std::path::Path;
use tgate_error::IngestError;
use tgate_types::{BenchmarkRecord, ColumnSpec};

/// Read and parse a benchmark results file.
pub fn read_benchmark_csv(
    path: &Path,
    columns: &ColumnSpec,
) -> Result<Vec<BenchmarkRecord>, IngestError> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_benchmark_csv(&text, columns)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "read benchmark results");
    Ok(records)
}

/// Parse benchmark results from CSV text.
///
/// A header-only table yields an empty vector; deciding that an empty table
/// is an error belongs to the caller.
pub fn parse_benchmark_csv(
    text: &str,
    columns: &ColumnSpec,
) -> Result<Vec<BenchmarkRecord>, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = CsvRows::new(text);

    let header = loop {
        match rows.next_record()? {
            Some(fields) if is_blank(&fields) => continue,
            Some(fields) => break fields,
            None => return Err(IngestError::MissingHeader),
        }
    };

    let events_idx = column_index(&header, &columns.events)?;
    let runtime_idx = column_index(&header, &columns.runtime)?;
    let width = header.len();

    let mut records = Vec::new();
    let mut row = 0;
    while let Some(fields) = rows.next_record()? {
        if is_blank(&fields) {
            continue;
        }
        row += 1;

        if fields.len() < width {
            return Err(IngestError::ShortRow {
                row,
                expected: width,
                found: fields.len(),
            });
        }

        records.push(BenchmarkRecord {
            row,
            events: parse_number(&fields[events_idx], row, &columns.events)?,
            runtime_s: parse_number(&fields[runtime_idx], row, &columns.runtime)?,
        });
    }

    Ok(records)
}

fn column_index(header: &[String], name: &str) -> Result<usize, IngestError> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
            header: header
                .iter()
                .map(|h| h.trim())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn parse_number(raw: &str, row: usize, column: &str) -> Result<f64, IngestError> {
    let value = raw.trim();
    value.parse::<f64>().map_err(|_| IngestError::InvalidNumber {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn is_blank(fields: &[String]) -> bool {
    fields.len() == 1 && fields[0].trim().is_empty()
}

/// Minimal RFC 4180 record splitter.
///
/// Quoted fields may contain separators, doubled quotes and line breaks.
/// Records end at `\n` or `\r\n`.
struct CsvRows<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> CsvRows<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn next_record(&mut self) -> Result<Option<Vec<String>>, IngestError> {
        if self.chars.peek().is_none() {
            return Ok(None);
        }

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut quote_line = self.line;

        while let Some(c) = self.chars.next() {
            if in_quotes {
                match c {
                    '"' if self.chars.peek() == Some(&'"') => {
                        self.chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    '\n' => {
                        self.line += 1;
                        field.push(c);
                    }
                    _ => field.push(c),
                }
                continue;
            }

            match c {
                '"' if field.is_empty() => {
                    in_quotes = true;
                    quote_line = self.line;
                }
                ',' => fields.push(std::mem::take(&mut field)),
                '\r' if self.chars.peek() == Some(&'\n') => {
                    self.chars.next();
                    self.line += 1;
                    fields.push(field);
                    return Ok(Some(fields));
                }
                '\n' => {
                    self.line += 1;
                    fields.push(field);
                    return Ok(Some(fields));
                }
                _ => field.push(c),
            }
        }

        if in_quotes {
            return Err(IngestError::UnterminatedQuote { line: quote_line });
        }

        fields.push(field);
        Ok(Some(fields))
    }
}
