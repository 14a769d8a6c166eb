//! Date, time and timestamp matching against caller-supplied patterns.
//!
//! Patterns arrive in the Unicode style used by the catalogue UI
//! (`yyyy-MM-dd`, `HH:mm:ss.SSS`) and are translated once into chrono
//! strftime items. A pattern that already contains `%` is used verbatim.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Unsupported pattern token '{0}'")]
    UnsupportedToken(String),
    #[error("Unterminated quoted literal in pattern '{0}'")]
    UnterminatedLiteral(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Time,
    Timestamp,
}

/// A translated pattern, ready to match values of one temporal kind.
#[derive(Debug, Clone)]
pub struct TemporalPattern {
    kind: TemporalKind,
    original: String,
    strftime: String,
    has_offset: bool,
}

impl TemporalPattern {
    pub fn compile(kind: TemporalKind, pattern: &str) -> Result<Self, PatternError> {
        let strftime = translate_pattern(pattern)?;
        let has_offset = strftime.contains("%z") || strftime.contains("%:z");
        Ok(Self {
            kind,
            original: pattern.to_string(),
            strftime,
            has_offset,
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// True when `value` fits the pattern and names a real calendar value;
    /// `2024-02-30` fails even though every digit lines up. Padded values
    /// never match since chrono skips whitespace before numeric fields.
    pub fn matches(&self, value: &str) -> bool {
        if value.trim() != value {
            return false;
        }
        let fmt = self.strftime.as_str();
        match self.kind {
            TemporalKind::Date => NaiveDate::parse_from_str(value, fmt).is_ok(),
            TemporalKind::Time => NaiveTime::parse_from_str(value, fmt).is_ok(),
            TemporalKind::Timestamp if self.has_offset => {
                DateTime::parse_from_str(value, fmt).is_ok()
            }
            TemporalKind::Timestamp => NaiveDateTime::parse_from_str(value, fmt).is_ok(),
        }
    }
}

pub fn translate_pattern(pattern: &str) -> Result<String, PatternError> {
    if pattern.contains('%') {
        return Ok(pattern.to_string());
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '\'' {
            if chars.get(idx + 1) == Some(&'\'') {
                out.push('\'');
                idx += 2;
                continue;
            }
            idx += 1;
            loop {
                match chars.get(idx) {
                    None => return Err(PatternError::UnterminatedLiteral(pattern.to_string())),
                    Some('\'') if chars.get(idx + 1) == Some(&'\'') => {
                        out.push('\'');
                        idx += 2;
                    }
                    Some('\'') => {
                        idx += 1;
                        break;
                    }
                    Some(literal) => {
                        out.push(*literal);
                        idx += 1;
                    }
                }
            }
            continue;
        }
        if !ch.is_ascii_alphabetic() {
            out.push(ch);
            idx += 1;
            continue;
        }
        let run = chars[idx..].iter().take_while(|c| **c == ch).count();
        out.push_str(token_to_strftime(ch, run)?);
        idx += run;
    }
    Ok(out)
}

fn token_to_strftime(letter: char, width: usize) -> Result<&'static str, PatternError> {
    let item = match (letter, width) {
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M' | 'L', 1 | 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', 4) => "%B",
        ('d', 1 | 2) => "%d",
        ('D', 1..=3) => "%j",
        ('H', 1 | 2) => "%H",
        ('h', 1 | 2) => "%I",
        ('m', 1 | 2) => "%M",
        ('s', 1 | 2) => "%S",
        ('S', 3) => "%3f",
        ('S', 6) => "%6f",
        ('S', 9) => "%9f",
        ('a', 1..=3) => "%p",
        ('E', 1..=3) => "%a",
        ('E', 4) => "%A",
        ('X' | 'x', 1 | 2) => "%z",
        ('X' | 'x', 3) => "%:z",
        _ => {
            return Err(PatternError::UnsupportedToken(
                std::iter::repeat_n(letter, width).collect(),
            ));
        }
    };
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_ui_default_patterns() {
        assert_eq!(translate_pattern("yyyy-MM-dd").unwrap(), "%Y-%m-%d");
        assert_eq!(translate_pattern("HH:mm:ss").unwrap(), "%H:%M:%S");
        assert_eq!(
            translate_pattern("yyyy-MM-dd HH:mm:ss.SSS").unwrap(),
            "%Y-%m-%d %H:%M:%S.%3f"
        );
    }

    #[test]
    fn quoted_literals_pass_through() {
        assert_eq!(
            translate_pattern("yyyy-MM-dd'T'HH:mm:ssXXX").unwrap(),
            "%Y-%m-%dT%H:%M:%S%:z"
        );
        assert_eq!(translate_pattern("HH 'o''clock'").unwrap(), "%H o'clock");
        assert_eq!(translate_pattern("h''mm").unwrap(), "%I'%M");
    }

    #[test]
    fn strftime_patterns_are_kept() {
        assert_eq!(translate_pattern("%d.%m.%Y").unwrap(), "%d.%m.%Y");
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert_eq!(
            translate_pattern("yyyy-QQ"),
            Err(PatternError::UnsupportedToken("QQ".to_string()))
        );
        assert!(matches!(
            translate_pattern("yyyy 'open"),
            Err(PatternError::UnterminatedLiteral(_))
        ));
    }

    #[test]
    fn date_matching_checks_calendar_validity() {
        let pattern = TemporalPattern::compile(TemporalKind::Date, "yyyy-MM-dd").unwrap();
        assert!(pattern.matches("2024-02-29"));
        assert!(!pattern.matches("2024-02-30"));
        assert!(!pattern.matches("2023-02-29"));
        assert!(!pattern.matches("2024-02-29 10:00:00"));
        assert!(!pattern.matches("hello"));
    }

    #[test]
    fn padded_values_do_not_match() {
        let date = TemporalPattern::compile(TemporalKind::Date, "yyyy-MM-dd").unwrap();
        assert!(!date.matches(" 2024-01-31"));
        assert!(!date.matches("2024-01-31 "));
        let time = TemporalPattern::compile(TemporalKind::Time, "HH:mm:ss").unwrap();
        assert!(!time.matches("\t08:15:00"));
        assert!(time.matches("08:15:00"));
    }

    #[test]
    fn timestamp_matching_handles_offsets_and_fractions() {
        let plain =
            TemporalPattern::compile(TemporalKind::Timestamp, "yyyy-MM-dd HH:mm:ss.SSS").unwrap();
        assert!(plain.matches("2024-05-10 13:45:00.123"));
        assert!(!plain.matches("2024-05-10 13:45:00"));
        assert!(!plain.matches("2024-05-10 25:45:00.123"));

        let zoned =
            TemporalPattern::compile(TemporalKind::Timestamp, "yyyy-MM-dd'T'HH:mm:ssXXX").unwrap();
        assert!(zoned.matches("2024-05-10T13:45:00+02:00"));
        assert!(!zoned.matches("2024-05-10T13:45:00"));
    }

    #[test]
    fn time_matching_rejects_out_of_range_values() {
        let pattern = TemporalPattern::compile(TemporalKind::Time, "HH:mm:ss").unwrap();
        assert!(pattern.matches("23:59:59"));
        assert!(!pattern.matches("24:00:01"));
        assert!(!pattern.matches("12:60:00"));
    }
}
