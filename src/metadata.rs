use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::SampleError,
    provider::StorageProvider,
    schema::{ColumnProfile, FormatHints, infer_columns},
    tokenizer::{CsvTokenizer, LineBreak, Tokenized, Tokenizer},
};

/// Bytes read from a delimited file before it is profiled.
pub const CSV_SAMPLE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Unknown,
}

impl FileType {
    /// `.csv` and `.csv.gz` are delimited text; everything else is unknown.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".csv") || lower.ends_with(".csv.gz") {
            FileType::Csv
        } else {
            FileType::Unknown
        }
    }
}

/// Structural description of a sampled file, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub field_delimiter: char,
    pub line_break: LineBreak,
    pub columns: Vec<ColumnProfile>,
}

impl FileMetadata {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating metadata file {path:?}"))?;
        if is_yaml_path(path) {
            serde_yaml::to_writer(file, self).context("Writing metadata YAML")
        } else {
            serde_json::to_writer_pretty(file, self).context("Writing metadata JSON")
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening metadata file {path:?}"))?;
        let reader = BufReader::new(file);
        let metadata = if is_yaml_path(path) {
            serde_yaml::from_reader(reader).context("Parsing metadata YAML")?
        } else {
            serde_json::from_reader(reader).context("Parsing metadata JSON")?
        };
        Ok(metadata)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|column| column.header_name == name)
    }
}

pub(crate) fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

pub fn profile(tokenized: &Tokenized, hints: &FormatHints) -> FileMetadata {
    FileMetadata {
        field_delimiter: char::from(tokenized.delimiter),
        line_break: tokenized.line_break,
        columns: infer_columns(&tokenized.rows, hints),
    }
}

pub fn sample_metadata(content: &str, hints: &FormatHints) -> Result<FileMetadata, SampleError> {
    sample_metadata_with(&CsvTokenizer::default(), content, hints)
}

pub fn sample_metadata_with<T: Tokenizer + ?Sized>(
    tokenizer: &T,
    content: &str,
    hints: &FormatHints,
) -> Result<FileMetadata, SampleError> {
    let tokenized = tokenizer.tokenize(content)?;
    Ok(profile(&tokenized, hints))
}

/// Reads the head of `path` from `provider` and infers its structure.
pub async fn sample_file_metadata(
    provider: &dyn StorageProvider,
    path: &str,
    hints: &FormatHints,
) -> Result<FileMetadata, SampleError> {
    sample_file_metadata_with(provider, &CsvTokenizer::default(), path, hints).await
}

pub async fn sample_file_metadata_with<T: Tokenizer + Sync + ?Sized>(
    provider: &dyn StorageProvider,
    tokenizer: &T,
    path: &str,
    hints: &FormatHints,
) -> Result<FileMetadata, SampleError> {
    match FileType::from_path(path) {
        FileType::Csv => {
            let content = provider.read_text(path, Some(CSV_SAMPLE_BYTES)).await?;
            let metadata = sample_metadata_with(tokenizer, &content, hints)?;
            info!(
                "Inferred {} column(s) for '{}' (delimiter '{}', line break {})",
                metadata.columns.len(),
                path,
                crate::tokenizer::printable_delimiter(metadata.field_delimiter as u8),
                metadata.line_break
            );
            Ok(metadata)
        }
        FileType::Unknown => Err(SampleError::UnknownFileType(path.to_string())),
    }
}
