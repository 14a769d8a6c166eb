mod common;

use common::hints;
use dwh_sampler::error::{ErrorCode, SampleError, TOKENIZE_FAILED, TokenizeError};
use dwh_sampler::metadata::{sample_metadata, sample_metadata_with};
use dwh_sampler::tokenizer::{CsvTokenizer, LineBreak, RECORD_SEPARATOR, Tokenized, Tokenizer};

/// Splits on newlines and commas with no quoting or detection.
struct NaiveTokenizer;

impl Tokenizer for NaiveTokenizer {
    fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError> {
        Ok(Tokenized {
            rows: text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.split(',').map(str::to_string).collect())
                .collect(),
            delimiter: b',',
            line_break: LineBreak::Lf,
        })
    }
}

#[test]
fn quoted_fields_keep_delimiters_and_line_breaks() {
    let text = "id,comment\n1,\"hello, world\"\n2,\"multi\nline\"\n3,\"say \"\"hi\"\"\"\n";
    let tokenized = CsvTokenizer::new().tokenize(text).expect("tokenize");
    assert_eq!(tokenized.delimiter, b',');
    assert_eq!(tokenized.line_break, LineBreak::Lf);
    assert_eq!(tokenized.rows.len(), 4);
    assert_eq!(tokenized.rows[1][1], "hello, world");
    assert_eq!(tokenized.rows[2][1], "multi\nline");
    assert_eq!(tokenized.rows[3][1], "say \"hi\"");
}

#[test]
fn record_separator_is_detected() {
    let rs = RECORD_SEPARATOR as char;
    let text = format!("a{rs}b{rs}c\n1{rs}2{rs}3\n");
    let metadata = sample_metadata(&text, &hints(true)).expect("sample");
    assert_eq!(metadata.field_delimiter, rs);
    assert_eq!(metadata.columns.len(), 3);
}

#[test]
fn tab_separated_sample_with_crlf() {
    let metadata = sample_metadata("name\tscore\r\nann\t9.5\r\nbob\t7\r\n", &hints(true))
        .expect("sample");
    assert_eq!(metadata.field_delimiter, '\t');
    assert_eq!(metadata.line_break, LineBreak::Crlf);
    assert_eq!(metadata.columns[1].scale, Some(1));
}

#[test]
fn replacement_tokenizer_drives_the_profiler() {
    let metadata =
        sample_metadata_with(&NaiveTokenizer, "x,y\n\"1\",2\n", &hints(true)).expect("sample");
    let first = metadata.column("x").expect("x column");
    assert_eq!(first.data_type().to_string(), "String");
    assert_eq!(first.precision, Some(3));
}

#[test]
fn tokenizer_failures_carry_their_own_code() {
    let err = SampleError::from(TokenizeError::from(csv::Error::from(std::io::Error::other(
        "stream closed",
    ))));
    assert_eq!(err.code(), TOKENIZE_FAILED);
    assert!(err.to_string().contains("stream closed"));
}

#[test]
fn empty_content_yields_no_columns() {
    let metadata = sample_metadata("", &hints(true)).expect("sample");
    assert!(metadata.columns.is_empty());
    assert_eq!(metadata.field_delimiter, ',');
    assert_eq!(metadata.line_break, LineBreak::Lf);
}
