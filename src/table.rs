use std::{borrow::Cow, fmt::Write as _};

use crate::{credentials::FileInfo, metadata::FileMetadata, tokenizer::printable_delimiter};

const COLUMN_GAP: &str = "  ";

/// Left-aligned plain-text table with a dashed rule under the header.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(clean_cell(cell).chars().count());
        }
    }

    let mut output = String::new();
    let header_cells: Vec<Cow<'_, str>> = headers.iter().map(|h| Cow::Borrowed(*h)).collect();
    push_line(&mut output, &header_cells, &widths);
    let rule: Vec<Cow<'_, str>> = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat((*w).max(3))))
        .collect();
    push_line(&mut output, &rule, &widths);
    for row in rows {
        let cells: Vec<Cow<'_, str>> = row.iter().map(|cell| clean_cell(cell)).collect();
        push_line(&mut output, &cells, &widths);
    }
    output
}

fn push_line(output: &mut String, cells: &[Cow<'_, str>], widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        let width = *width;
        let _ = write!(line, "{cell:<width$}");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn clean_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn render_metadata(metadata: &FileMetadata) -> String {
    let rows: Vec<Vec<String>> = metadata
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.header_name.clone(),
                column.data_type().to_string(),
                if column.nullable { "yes" } else { "no" }.to_string(),
                optional(column.precision),
                optional(column.scale),
                column.format.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let mut output = format!(
        "Delimiter: {}\nLine break: {}\n\n",
        printable_delimiter(metadata.field_delimiter as u8),
        metadata.line_break
    );
    output.push_str(&render_table(
        &["#", "name", "type", "nullable", "precision", "scale", "format"],
        &rows,
    ));
    output
}

pub fn render_files(files: &[FileInfo]) -> String {
    let rows: Vec<Vec<String>> = files
        .iter()
        .map(|file| {
            vec![
                file.name.clone(),
                file.size.to_string(),
                file.last_modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();
    render_table(&["name", "size", "last_modified"], &rows)
}

pub fn render_folders(folders: &[String]) -> String {
    let rows: Vec<Vec<String>> = folders.iter().map(|f| vec![f.clone()]).collect();
    render_table(&["folder"], &rows)
}
