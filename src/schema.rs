//! Column profiling and type inference over sampled rows.
//!
//! Profiling is a single row-major pass. Every column keeps a
//! [`ColumnProfile`] accumulator that records the first type seen, falls back
//! to `String` for good on the first conflicting value, and tracks
//! nullability together with running maxima for precision and scale.
//!
//! Classification order for a single value:
//!
//! 1. blank (whitespace only) → no type, marks the column nullable
//! 2. `true` / `false` → `Boolean`
//! 3. timestamp pattern → `Timestamp`
//! 4. date pattern → `Date`
//! 5. time pattern → `Time`
//! 6. finite float (locale decimal separator) → `Number`
//! 7. anything else → `String`

use std::{borrow::Cow, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::temporal::{TemporalKind, TemporalPattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Number,
    Date,
    Time,
    Timestamp,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Number => "Number",
            ColumnType::Date => "Date",
            ColumnType::Time => "Time",
            ColumnType::Timestamp => "Timestamp",
            ColumnType::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(ColumnType::String),
            "number" => Ok(ColumnType::Number),
            "date" => Ok(ColumnType::Date),
            "time" => Ok(ColumnType::Time),
            "timestamp" => Ok(ColumnType::Timestamp),
            "boolean" => Ok(ColumnType::Boolean),
            other => Err(anyhow!("Unknown column type '{other}'")),
        }
    }
}

/// Parsing conventions supplied by the caller for one profiling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatHints {
    pub has_header_row: bool,
    pub date_format: String,
    pub time_format: String,
    pub timestamp_format: String,
    pub decimal_separator: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGuess {
    pub column_type: ColumnType,
    pub format: Option<String>,
}

impl TypeGuess {
    fn plain(column_type: ColumnType) -> Self {
        Self {
            column_type,
            format: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub header_name: String,
    pub guessed_type: Option<ColumnType>,
    pub nullable: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub format: Option<String>,
}

impl ColumnProfile {
    pub fn new(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
            guessed_type: None,
            nullable: false,
            precision: None,
            scale: None,
            format: None,
        }
    }

    /// Placeholder name for the zero-based column `index`.
    pub fn synthetic(index: usize) -> Self {
        Self::new(format!("COLUMN_{}", index + 1))
    }

    /// The type to persist; columns that never saw a value are strings.
    pub fn data_type(&self) -> ColumnType {
        self.guessed_type.unwrap_or(ColumnType::String)
    }

    fn observe(&mut self, value: &str, guess: Option<TypeGuess>, decimal_separator: char) {
        if let Some(guess) = guess {
            match self.guessed_type {
                None => {
                    self.guessed_type = Some(guess.column_type);
                    self.format = guess.format;
                }
                Some(current) if current != guess.column_type => {
                    if current != ColumnType::String {
                        debug!(
                            "Column '{}' saw {} after {}; falling back to String",
                            self.header_name, guess.column_type, current
                        );
                    }
                    self.guessed_type = Some(ColumnType::String);
                    self.format = None;
                }
                Some(_) => {}
            }
        }

        self.nullable |= is_null(value);

        let effective = self.data_type();
        let precision = get_precision(value, effective, decimal_separator).unwrap_or(0);
        let scale = get_scale(value, effective, decimal_separator).unwrap_or(0);
        self.precision = Some(self.precision.unwrap_or(0).max(precision));
        self.scale = Some(self.scale.unwrap_or(0).max(scale));
    }

    /// Drops precision and scale the final type has no use for.
    fn finalize(mut self) -> Self {
        match self.guessed_type {
            Some(ColumnType::Number) => {}
            Some(ColumnType::String) => self.scale = None,
            _ => {
                self.precision = None;
                self.scale = None;
            }
        }
        self
    }
}

/// Format hints with their temporal patterns compiled once per run.
#[derive(Debug, Clone)]
pub struct TypeGuesser {
    timestamp: Option<TemporalPattern>,
    date: Option<TemporalPattern>,
    time: Option<TemporalPattern>,
    decimal_separator: char,
}

impl TypeGuesser {
    pub fn new(hints: &FormatHints) -> Self {
        Self {
            timestamp: compile(TemporalKind::Timestamp, &hints.timestamp_format),
            date: compile(TemporalKind::Date, &hints.date_format),
            time: compile(TemporalKind::Time, &hints.time_format),
            decimal_separator: hints.decimal_separator,
        }
    }

    pub fn guess(&self, value: &str) -> Option<TypeGuess> {
        if is_null(value) {
            return None;
        }
        if value == "true" || value == "false" {
            return Some(TypeGuess::plain(ColumnType::Boolean));
        }
        let temporal = [
            (&self.timestamp, ColumnType::Timestamp),
            (&self.date, ColumnType::Date),
            (&self.time, ColumnType::Time),
        ];
        for (pattern, column_type) in temporal {
            if let Some(pattern) = pattern {
                if pattern.matches(value) {
                    return Some(TypeGuess {
                        column_type,
                        format: Some(pattern.original().to_string()),
                    });
                }
            }
        }
        if parse_number(value, self.decimal_separator).is_some() {
            return Some(TypeGuess::plain(ColumnType::Number));
        }
        Some(TypeGuess::plain(ColumnType::String))
    }
}

fn compile(kind: TemporalKind, pattern: &str) -> Option<TemporalPattern> {
    match TemporalPattern::compile(kind, pattern) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            warn!("Ignoring {kind:?} format '{pattern}': {err}");
            None
        }
    }
}

pub fn guess_type(value: &str, hints: &FormatHints) -> Option<TypeGuess> {
    TypeGuesser::new(hints).guess(value)
}

pub fn is_null(value: &str) -> bool {
    value.trim().is_empty()
}

/// Parses `value` as a finite float after swapping the locale decimal
/// separator for `.`.
pub fn parse_number(value: &str, decimal_separator: char) -> Option<f64> {
    let trimmed = value.trim();
    let normalized: Cow<'_, str> = if decimal_separator == '.' {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(trimmed.replace(decimal_separator, "."))
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

fn count_digits(text: &str) -> u32 {
    text.chars().filter(char::is_ascii_digit).count() as u32
}

/// Character length for strings, integer plus fraction digits for numbers.
pub fn get_precision(value: &str, column_type: ColumnType, decimal_separator: char) -> Option<u32> {
    match column_type {
        ColumnType::String => Some(value.chars().count() as u32),
        ColumnType::Number => {
            let (integer, fraction) = value
                .split_once(decimal_separator)
                .unwrap_or((value, ""));
            Some(count_digits(integer) + count_digits(fraction))
        }
        _ => None,
    }
}

pub fn get_scale(value: &str, column_type: ColumnType, decimal_separator: char) -> Option<u32> {
    match column_type {
        ColumnType::Number => Some(
            value
                .split_once(decimal_separator)
                .map(|(_, fraction)| count_digits(fraction))
                .unwrap_or(0),
        ),
        _ => None,
    }
}

/// Profiles every column of `rows`.
///
/// With a header row the first row only names the columns. Rows wider than
/// anything seen before add `COLUMN_n` profiles on the fly; shorter rows leave
/// the missing columns untouched.
pub fn infer_columns(rows: &[Vec<String>], hints: &FormatHints) -> Vec<ColumnProfile> {
    let guesser = TypeGuesser::new(hints);
    let mut data_rows = rows.iter();
    let mut profiles: Vec<ColumnProfile> = Vec::new();

    if hints.has_header_row {
        if let Some(header) = data_rows.next() {
            profiles = header.iter().map(ColumnProfile::new).collect();
        }
    }

    let mut sampled = 0usize;
    for row in data_rows {
        for (idx, value) in row.iter().enumerate() {
            if idx == profiles.len() {
                profiles.push(ColumnProfile::synthetic(idx));
            }
            let guess = guesser.guess(value);
            profiles[idx].observe(value, guess, hints.decimal_separator);
        }
        sampled += 1;
    }

    debug!(
        "Profiled {} column(s) over {} sampled row(s)",
        profiles.len(),
        sampled
    );
    profiles.into_iter().map(ColumnProfile::finalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> FormatHints {
        FormatHints {
            has_header_row: false,
            date_format: "yyyy-MM-dd".to_string(),
            time_format: "HH:mm:ss".to_string(),
            timestamp_format: "yyyy-MM-dd HH:mm:ss".to_string(),
            decimal_separator: '.',
        }
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect()
    }

    #[test]
    fn guess_follows_classification_order() {
        let hints = hints();
        let kind = |value: &str| guess_type(value, &hints).map(|guess| guess.column_type);
        assert_eq!(kind("   "), None);
        assert_eq!(kind("true"), Some(ColumnType::Boolean));
        assert_eq!(kind("TRUE"), Some(ColumnType::String));
        assert_eq!(kind("2024-01-31 08:15:00"), Some(ColumnType::Timestamp));
        assert_eq!(kind("2024-01-31"), Some(ColumnType::Date));
        assert_eq!(kind(" 2024-01-31"), Some(ColumnType::String));
        assert_eq!(kind("08:15:00"), Some(ColumnType::Time));
        assert_eq!(kind("-12.5e3"), Some(ColumnType::Number));
        assert_eq!(kind("NaN"), Some(ColumnType::String));
        assert_eq!(kind("inf"), Some(ColumnType::String));
        assert_eq!(kind("2024-02-30"), Some(ColumnType::String));
    }

    #[test]
    fn temporal_guesses_carry_the_matching_pattern() {
        let guess = guess_type("2024-01-31", &hints()).expect("guess");
        assert_eq!(guess.format.as_deref(), Some("yyyy-MM-dd"));
        let guess = guess_type("42", &hints()).expect("guess");
        assert_eq!(guess.format, None);
    }

    #[test]
    fn decimal_separator_controls_number_parsing() {
        assert_eq!(parse_number("2,5", ','), Some(2.5));
        assert_eq!(parse_number("2,5", '.'), None);
        assert_eq!(parse_number(" 7 ", '.'), Some(7.0));
    }

    #[test]
    fn precision_counts_digits_without_sign() {
        assert_eq!(get_precision("-123.45", ColumnType::Number, '.'), Some(5));
        assert_eq!(get_precision("42", ColumnType::Number, '.'), Some(2));
        assert_eq!(get_precision("3,125", ColumnType::Number, ','), Some(4));
        assert_eq!(get_precision("héllo", ColumnType::String, '.'), Some(5));
        assert_eq!(get_precision("2024-01-01", ColumnType::Date, '.'), None);
        assert_eq!(get_scale("-123.45", ColumnType::Number, '.'), Some(2));
        assert_eq!(get_scale("123", ColumnType::Number, '.'), Some(0));
        assert_eq!(get_scale("abc", ColumnType::String, '.'), None);
    }

    #[test]
    fn conflicting_values_freeze_the_column_to_string() {
        let profiles = infer_columns(&rows(&[&["2024-01-01"], &["7"], &["2024-01-02"]]), &hints());
        assert_eq!(profiles[0].guessed_type, Some(ColumnType::String));
        assert_eq!(profiles[0].format, None);
    }

    #[test]
    fn empty_columns_have_no_type_and_no_precision() {
        let mut hints = hints();
        hints.has_header_row = true;
        let profiles = infer_columns(&rows(&[&["id", "note"], &["1", ""], &["2", " "]]), &hints);
        assert_eq!(profiles[1].header_name, "note");
        assert_eq!(profiles[1].guessed_type, None);
        assert_eq!(profiles[1].data_type(), ColumnType::String);
        assert!(profiles[1].nullable);
        assert_eq!(profiles[1].precision, None);
        assert_eq!(profiles[1].scale, None);
    }

    #[test]
    fn ragged_rows_add_synthetic_columns() {
        let mut hints = hints();
        hints.has_header_row = true;
        let profiles = infer_columns(&rows(&[&["a"], &["1"], &["2", "x", "true"]]), &hints);
        let names: Vec<&str> = profiles.iter().map(|p| p.header_name.as_str()).collect();
        assert_eq!(names, vec!["a", "COLUMN_2", "COLUMN_3"]);
        assert_eq!(profiles[2].guessed_type, Some(ColumnType::Boolean));
        assert!(!profiles[1].nullable);
    }

    #[test]
    fn temporal_columns_drop_precision_and_keep_format() {
        let profiles = infer_columns(&rows(&[&["08:00:00"], &["17:30:00"]]), &hints());
        assert_eq!(profiles[0].guessed_type, Some(ColumnType::Time));
        assert_eq!(profiles[0].format.as_deref(), Some("HH:mm:ss"));
        assert_eq!(profiles[0].precision, None);
        assert_eq!(profiles[0].scale, None);
    }

    #[test]
    fn column_type_parses_case_insensitively() {
        assert_eq!("timestamp".parse::<ColumnType>().unwrap(), ColumnType::Timestamp);
        assert!("decimal".parse::<ColumnType>().is_err());
    }
}
