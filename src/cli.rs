use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    schema::FormatHints,
    tokenizer::{RECORD_SEPARATOR, UNIT_SEPARATOR},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Sample delimited files in cloud storage and infer their schema",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the bucket behind a credentials file is reachable
    TestConnection(ConnectionArgs),
    /// List every folder in the bucket
    Folders(ConnectionArgs),
    /// List files directly below a folder
    Files(FilesArgs),
    /// Print the head of an object, inflating `.gz` content
    Read(ReadArgs),
    /// Infer the structure of a delimited file held in the bucket
    Sample(SampleArgs),
    /// Infer the structure of a local delimited file
    Infer(InferArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// YAML or JSON file holding provider credentials (`provider: s3|gcs`)
    #[arg(short = 'c', long = "credentials")]
    pub credentials: PathBuf,
    /// Output rendering
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct FilesArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Folder to list; empty or `/` lists the bucket root
    #[arg(long, default_value = "")]
    pub prefix: String,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Object key to read
    #[arg(short = 'p', long = "path")]
    pub path: String,
    /// Stop after this many (decompressed) bytes
    #[arg(long = "max-size")]
    pub max_size: Option<u64>,
    /// Write the content to a file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SampleArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Object key of the `.csv` or `.csv.gz` file to sample
    #[arg(short = 'p', long = "path")]
    pub path: String,
    #[command(flatten)]
    pub hints: HintArgs,
    /// Also write the inferred metadata (.json, .yaml or .yml)
    #[arg(short = 'm', long = "meta")]
    pub meta: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// Local `.csv` or `.csv.gz` file to sample
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub hints: HintArgs,
    /// Also write the inferred metadata (.json, .yaml or .yml)
    #[arg(short = 'm', long = "meta")]
    pub meta: Option<PathBuf>,
    /// Output rendering
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct HintArgs {
    /// Treat the first record as column names
    #[arg(long = "header")]
    pub has_header_row: bool,
    /// Date pattern, e.g. `yyyy-MM-dd` or `%d.%m.%Y`
    #[arg(long = "date-format", default_value = "yyyy-MM-dd")]
    pub date_format: String,
    /// Time pattern
    #[arg(long = "time-format", default_value = "HH:mm:ss")]
    pub time_format: String,
    /// Timestamp pattern
    #[arg(long = "timestamp-format", default_value = "yyyy-MM-dd HH:mm:ss.SSS")]
    pub timestamp_format: String,
    /// Decimal separator used by numeric values
    #[arg(long = "decimal-separator", default_value_t = '.')]
    pub decimal_separator: char,
    /// Load every hint from a YAML or JSON file instead of the flags above
    #[arg(long = "hints", conflicts_with_all = [
        "has_header_row",
        "date_format",
        "time_format",
        "timestamp_format",
        "decimal_separator",
    ])]
    pub hints_file: Option<PathBuf>,
    /// Field delimiter; detected from the content when omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

impl HintArgs {
    pub fn to_hints(&self) -> FormatHints {
        FormatHints {
            has_header_row: self.has_header_row,
            date_format: self.date_format.clone(),
            time_format: self.time_format.clone(),
            timestamp_format: self.timestamp_format.clone(),
            decimal_separator: self.decimal_separator,
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        "rs" | "\\x1e" => Ok(RECORD_SEPARATOR),
        "us" | "\\x1f" => Ok(UNIT_SEPARATOR),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_aliases_are_accepted() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("rs"), Ok(RECORD_SEPARATOR));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn hint_flags_default_to_catalogue_conventions() {
        let cli = Cli::try_parse_from(["dwh-sampler", "infer", "-i", "orders.csv"])
            .expect("parse infer");
        let Commands::Infer(args) = cli.command else {
            panic!("expected infer command");
        };
        let hints = args.hints.to_hints();
        assert!(!hints.has_header_row);
        assert_eq!(hints.date_format, "yyyy-MM-dd");
        assert_eq!(hints.timestamp_format, "yyyy-MM-dd HH:mm:ss.SSS");
        assert_eq!(hints.decimal_separator, '.');
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn hints_file_conflicts_with_explicit_flags() {
        let parsed = Cli::try_parse_from([
            "dwh-sampler",
            "infer",
            "-i",
            "orders.csv",
            "--hints",
            "hints.yaml",
            "--header",
        ]);
        assert!(parsed.is_err());
    }
}
