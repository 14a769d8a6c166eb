//! Record and field splitting for sampled delimited text.
//!
//! The field delimiter and line break convention are sniffed from the sample
//! itself; the catalogue does not trust the delimiter stored with a file.

use std::fmt;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

use crate::error::TokenizeError;

pub const RECORD_SEPARATOR: u8 = 0x1E;
pub const UNIT_SEPARATOR: u8 = 0x1F;
pub const DELIMITER_CANDIDATES: &[u8] =
    &[b',', b'\t', b'|', b';', RECORD_SEPARATOR, UNIT_SEPARATOR];
pub const DEFAULT_DELIMITER: u8 = b',';
pub const DEFAULT_QUOTE: u8 = b'"';

const DETECTION_PREVIEW_ROWS: usize = 10;
const LINE_BREAK_SCAN_BYTES: usize = 1024 * 1024;
const MIN_AVERAGE_FIELDS: f64 = 1.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineBreak {
    #[serde(rename = "CRLF")]
    Crlf,
    #[serde(rename = "LF")]
    Lf,
    #[serde(rename = "CR")]
    Cr,
}

impl LineBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineBreak::Crlf => "CRLF",
            LineBreak::Lf => "LF",
            LineBreak::Cr => "CR",
        }
    }
}

impl fmt::Display for LineBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenized {
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
    pub line_break: LineBreak,
}

/// Turns raw text into rows of fields.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError>;
}

#[derive(Debug, Clone)]
pub struct CsvTokenizer {
    delimiter: Option<u8>,
    quote: u8,
}

impl Default for CsvTokenizer {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: DEFAULT_QUOTE,
        }
    }
}

impl CsvTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips delimiter detection.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }
}

impl Tokenizer for CsvTokenizer {
    fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError> {
        let line_break = detect_line_break(text, self.quote);
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| detect_delimiter(text, self.quote));
        let rows = read_rows(text, delimiter, self.quote, None)?;
        Ok(Tokenized {
            rows,
            delimiter,
            line_break,
        })
    }
}

fn open_reader(text: &str, delimiter: u8, quote: u8) -> csv::Reader<&[u8]> {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .quote(quote)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(text.as_bytes())
}

fn is_blank_record(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// Reads records, dropping those made of whitespace only. A record cut off
/// by a byte ceiling is kept as far as it goes.
fn read_rows(
    text: &str,
    delimiter: u8,
    quote: u8,
    limit: Option<usize>,
) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = open_reader(text, delimiter, quote);
    let mut record = StringRecord::new();
    let mut rows = Vec::new();
    while limit.is_none_or(|max| rows.len() < max) && reader.read_record(&mut record)? {
        if is_blank_record(&record) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Picks the candidate whose preview rows have the steadiest field count,
/// preferring more fields on ties. Falls back to `,`.
pub fn detect_delimiter(text: &str, quote: u8) -> u8 {
    let mut best: Option<(u8, usize, f64)> = None;
    for &candidate in DELIMITER_CANDIDATES {
        let Ok(rows) = read_rows(text, candidate, quote, Some(DETECTION_PREVIEW_ROWS)) else {
            continue;
        };
        if rows.is_empty() {
            continue;
        }
        let mut total = 0usize;
        let mut delta = 0usize;
        let mut previous: Option<usize> = None;
        for row in &rows {
            total += row.len();
            if let Some(prev) = previous {
                delta += prev.abs_diff(row.len());
            }
            previous = Some(row.len());
        }
        let average = total as f64 / rows.len() as f64;
        if average <= MIN_AVERAGE_FIELDS {
            continue;
        }
        let better = best.is_none_or(|(_, best_delta, best_average)| {
            delta < best_delta || (delta == best_delta && average > best_average)
        });
        if better {
            best = Some((candidate, delta, average));
        }
    }
    best.map(|(delimiter, _, _)| delimiter)
        .unwrap_or(DEFAULT_DELIMITER)
}

/// Looks at the first MiB outside quoted fields. LF wins when there is no CR
/// or an LF comes first; otherwise CRLF when at least half of the CR splits
/// start with LF, else CR.
pub fn detect_line_break(text: &str, quote: u8) -> LineBreak {
    let bytes = text.as_bytes();
    let sample = &bytes[..bytes.len().min(LINE_BREAK_SCAN_BYTES)];
    let mut in_quotes = false;
    let mut first_cr: Option<usize> = None;
    let mut first_lf: Option<usize> = None;
    let mut cr_count = 0usize;
    let mut crlf_count = 0usize;

    for (pos, &byte) in sample.iter().enumerate() {
        if byte == quote {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        match byte {
            b'\r' => {
                cr_count += 1;
                first_cr.get_or_insert(pos);
                if sample.get(pos + 1) == Some(&b'\n') {
                    crlf_count += 1;
                }
            }
            b'\n' => {
                first_lf.get_or_insert(pos);
            }
            _ => {}
        }
    }

    let lf_first = matches!((first_lf, first_cr), (Some(lf), Some(cr)) if lf < cr);
    if cr_count == 0 || lf_first {
        LineBreak::Lf
    } else if crlf_count * 2 >= cr_count + 1 {
        LineBreak::Crlf
    } else {
        LineBreak::Cr
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        RECORD_SEPARATOR => "\\x1e".to_string(),
        UNIT_SEPARATOR => "\\x1f".to_string(),
        other => (other as char).to_string(),
    }
}
