//! Spreadsheet extractor (XLSX, XLS, ODS) backed by calamine.

use super::xml::{open_package, parse_core_properties, read_part};
use super::{start_document, title_from_source, ExtractOptions, Extractor};
use crate::bidi::detect_direction;
use crate::error::{Error, Result};
use crate::model::{Document, ExtractionWarning, Heading, Table};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

/// Rows kept per sheet; the rest is dropped with a warning.
const MAX_ROWS: usize = 10_000;

/// Extractor for spreadsheets.
///
/// Each sheet becomes one page holding a level-2 heading with the sheet
/// name followed by the used range as a table whose first row is the header.
#[derive(Debug, Default)]
pub struct XlsxExtractor;

impl XlsxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for XlsxExtractor {
    fn name(&self) -> &str {
        "xlsx"
    }

    fn format_tags(&self) -> &[&str] {
        &["xlsx", "xls", "ods"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| Error::corrupt(options.format_or("xlsx"), e))?;

        let mut builder = start_document("xlsx", options);
        if let Ok(mut archive) = open_package(bytes, "xlsx") {
            if let Some(core) = read_part(&mut archive, "docProps/core.xml") {
                parse_core_properties(&core).apply(&mut builder);
            }
        }
        if builder.current_title().is_none() {
            if let Some(title) = title_from_source(options) {
                builder.set_title(title);
            }
        }

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        for name in &sheet_names {
            let number = builder.page_count() as u32 + 1;
            let range = workbook.worksheet_range(name);
            let page = builder.new_page();
            page.title = Some(name.clone());
            page.push(Heading::new(2, name.clone()).with_direction(detect_direction(name)));

            let range = match range {
                Ok(range) => range,
                Err(e) => {
                    builder.warn(ExtractionWarning::page(
                        number,
                        format!("sheet '{}' is unreadable: {}", name, e),
                    ));
                    continue;
                }
            };

            let (rows, truncated) = sheet_rows(&range, options);
            if !rows.is_empty() {
                let header_rows = usize::from(rows.len() > 1);
                let table = Table::new(rows).with_header_rows(header_rows);
                let direction = detect_direction(&table.plain_text());
                page.direction = direction;
                page.push(table.with_direction(direction));
            }
            if truncated > 0 {
                builder.warn(ExtractionWarning::block(
                    number,
                    1,
                    format!("sheet '{}': {} rows beyond {} dropped", name, truncated, MAX_ROWS),
                ));
            }
        }

        Ok(builder.build()?)
    }
}

/// Used rows as strings, with trailing empty rows and columns trimmed.
fn sheet_rows(range: &Range<Data>, options: &ExtractOptions) -> (Vec<Vec<String>>, usize) {
    let mut rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| options.clean(&cell_to_string(cell))).collect())
        .collect();

    while rows.last().is_some_and(|row: &Vec<String>| row.iter().all(String::is_empty)) {
        rows.pop();
    }
    let width = rows
        .iter()
        .map(|row| row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1))
        .max()
        .unwrap_or(0);
    for row in &mut rows {
        row.truncate(width);
    }

    let truncated = rows.len().saturating_sub(MAX_ROWS);
    rows.truncate(MAX_ROWS);
    (rows, truncated)
}

/// Convert a cell value to a string.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                format!("{:.2}", f)
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}
