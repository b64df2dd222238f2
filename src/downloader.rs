use log::warn;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::group::{Group, GroupValue, PdfEntry};

/// Placeholder written into cells with no content
pub const EMPTY_CELL: &str = "N/A";

/// Width of the single value column of a flat export
pub const VALUE_COLUMN_WIDTH: f64 = 40.0;

/// Width of each column of a grid export
pub const GRID_COLUMN_WIDTH: f64 = 15.0;

/// Most characters a single XLSX cell may hold
pub const MAX_CELL_CHARS: usize = 32_767;

/// Separator between values joined into one cell
const JOIN_SEPARATOR: &str = ", ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build workbook: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

/// Download formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Parse the `format` query parameter; absent means XLSX
    pub fn from_query(raw: Option<&str>) -> Result<Self, ExportError> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("xlsx") => Ok(ExportFormat::Xlsx),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(other) => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// How a flat list of values is laid out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// One header cell, then one row per value
    Column,
    /// `n` values per row under headers `<header> 1` .. `<header> n`
    Grid(usize),
}

/// Rectangular sheet ready to be written out
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    widths: Vec<f64>,
}

fn cell(value: &str) -> String {
    if value.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        value.to_string()
    }
}

impl Table {
    /// Lay out a flat list of values
    ///
    /// # Arguments
    /// * `sheet_name` - Worksheet name
    /// * `header` - Column header, or header prefix for grids
    /// * `values` - Values in output order
    /// * `layout` - Column or grid layout
    ///
    /// # Examples
    /// ```
    /// use knowmyslots::downloader::{Layout, Table};
    ///
    /// let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    /// let table = Table::from_values("Contacts", "Contact", &values, Layout::Grid(2));
    /// assert_eq!(table.headers, vec!["Contact 1", "Contact 2"]);
    /// assert_eq!(table.rows[1], vec!["c", "N/A"]);
    /// ```
    pub fn from_values(sheet_name: &str, header: &str, values: &[String], layout: Layout) -> Table {
        match layout {
            Layout::Column => Table {
                sheet_name: sheet_name.to_string(),
                headers: vec![header.to_string()],
                rows: values.iter().map(|v| vec![cell(v)]).collect(),
                widths: vec![VALUE_COLUMN_WIDTH],
            },
            Layout::Grid(columns) => {
                let columns = columns.max(1);
                let rows = values
                    .chunks(columns)
                    .map(|chunk| {
                        let mut row: Vec<String> = chunk.iter().map(|v| cell(v)).collect();
                        row.resize(columns, EMPTY_CELL.to_string());
                        row
                    })
                    .collect();

                Table {
                    sheet_name: sheet_name.to_string(),
                    headers: (1..=columns).map(|i| format!("{header} {i}")).collect(),
                    rows,
                    widths: vec![GRID_COLUMN_WIDTH; columns],
                }
            }
        }
    }

    /// One row per group: year, season (when `seasoned`), label and the joined values
    ///
    /// A group whose joined values would not fit in one cell continues on
    /// further rows carrying the same year, season and label.
    pub fn from_groups<V: GroupValue>(
        sheet_name: &str,
        values_header: &str,
        groups: &[Group<V>],
        seasoned: bool,
    ) -> Table {
        let mut headers = vec!["Year".to_string()];
        let mut widths = vec![10.0];
        if seasoned {
            headers.push("Season".to_string());
            widths.push(10.0);
        }
        headers.extend(["Label".to_string(), values_header.to_string()]);
        widths.extend([20.0, 40.0]);

        let rows = groups
            .iter()
            .flat_map(|group| {
                let values: Vec<&str> = group.values.iter().map(|v| v.identity()).collect();

                join_within_limit(&values, MAX_CELL_CHARS)
                    .into_iter()
                    .map(move |joined| {
                        let mut row = vec![cell(&group.year)];
                        if seasoned {
                            row.push(cell(group.season.as_deref().unwrap_or_default()));
                        }
                        row.push(cell(&group.label));
                        row.push(cell(&joined));
                        row
                    })
            })
            .collect();

        Table {
            sheet_name: sheet_name.to_string(),
            headers,
            rows,
            widths,
        }
    }

    /// One row per stored PDF
    pub fn from_pdfs(groups: &[Group<PdfEntry>]) -> Table {
        let rows = groups
            .iter()
            .flat_map(|group| {
                group.values.iter().map(move |pdf| {
                    vec![
                        cell(&group.year),
                        cell(&group.label),
                        cell(&pdf.url),
                        cell(&pdf.description),
                    ]
                })
            })
            .collect();

        Table {
            sheet_name: "Pdfs".to_string(),
            headers: ["Year", "Label", "URL", "Description"]
                .map(String::from)
                .to_vec(),
            rows,
            widths: vec![10.0, 20.0, 50.0, 40.0],
        }
    }
}

/// Join values with `", "` into as few chunks as possible, each at most `limit` characters
///
/// A single value longer than `limit` is split across chunks. An empty list
/// yields one empty chunk so the group still gets its row.
///
/// # Examples
/// ```
/// use knowmyslots::downloader::join_within_limit;
///
/// assert_eq!(join_within_limit(&["ab", "cd", "ef"], 6), vec!["ab, cd", "ef"]);
/// assert_eq!(join_within_limit(&[], 6), vec![""]);
/// ```
pub fn join_within_limit(values: &[&str], limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let separator_len = JOIN_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for value in values {
        let value_len = value.chars().count();

        if current_len > 0 && current_len + separator_len + value_len <= limit {
            current.push_str(JOIN_SEPARATOR);
            current.push_str(value);
            current_len += separator_len + value_len;
            continue;
        }

        if current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if value_len <= limit {
            current.push_str(value);
            current_len = value_len;
        } else {
            let chars: Vec<char> = value.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
        }
    }

    if current_len > 0 || chunks.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Render a table in the requested format
pub fn render(table: &Table, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Xlsx => to_xlsx(table),
        ExportFormat::Csv => Ok(to_csv(table).into_bytes()),
    }
}

/// Convert a table to CSV
///
/// Fields containing commas, quotes, `\n` or `\r` are quoted, with inner
/// quotes doubled.
pub fn to_csv(table: &Table) -> String {
    let mut csv_content = String::new();

    for row in std::iter::once(&table.headers).chain(table.rows.iter()) {
        for (c, value) in row.iter().enumerate() {
            if c > 0 {
                csv_content.push(',');
            }
            if value.contains([',', '"', '\n', '\r']) {
                let escaped = value.replace('"', "\"\"");
                csv_content.push_str(&format!("\"{escaped}\""));
            } else {
                csv_content.push_str(value);
            }
        }
        csv_content.push('\n');
    }

    csv_content
}

/// Cut a cell to [`MAX_CELL_CHARS`] characters
fn clip(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            warn!("Cell of {} characters clipped for XLSX", value.chars().count());
            &value[..end]
        }
        None => value,
    }
}

/// Convert a table to XLSX bytes
///
/// The header row is bold and every column gets its fixed width.
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    let bold = Format::new().set_bold();

    for (c, width) in table.widths.iter().enumerate() {
        worksheet.set_column_width(c as u16, *width)?;
    }

    for (c, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, header, &bold)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            worksheet.write_string((r + 1) as u32, c as u16, clip(value))?;
        }
    }

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}
