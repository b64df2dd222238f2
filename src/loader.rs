use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use std::error::Error;
use std::io::Cursor;

use crate::downloader::EMPTY_CELL;

/// Read exported CSV text back into rows
///
/// The first row is the header row. Quoted fields may contain commas and
/// doubled quotes; a trailing newline does not produce an empty row.
///
/// # Examples
/// ```
/// use knowmyslots::loader::from_csv;
///
/// let rows = from_csv("Emails\n\"a,b\"\nc\n").unwrap();
/// assert_eq!(rows, vec![vec!["Emails"], vec!["a,b"], vec!["c"]]);
/// ```
pub fn from_csv(content: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut rows = Vec::new();
    let mut current_row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                current_row.push(std::mem::take(&mut current_field));
            }
            '\n' if !in_quotes => {
                current_row.push(std::mem::take(&mut current_field));
                rows.push(std::mem::take(&mut current_row));
            }
            '\r' if !in_quotes => {}
            _ => current_field.push(c),
        }
    }

    if in_quotes {
        return Err("Unterminated quoted field".into());
    }

    if !current_field.is_empty() || !current_row.is_empty() {
        current_row.push(current_field);
        rows.push(current_row);
    }

    Ok(rows)
}

/// Read the first worksheet of an exported XLSX file back into rows
pub fn from_xlsx(bytes: &[u8]) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or("No sheets found in Excel file")?;

    let range = workbook.worksheet_range(&sheet_name)?;

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Flatten data rows (header excluded) back into the value list
///
/// Only the `N/A` cells padding the end of the last row are skipped. An `N/A`
/// anywhere else is a stored value.
pub fn values_from_rows(rows: &[Vec<String>]) -> Vec<String> {
    let mut values: Vec<String> = rows.iter().skip(1).flatten().cloned().collect();

    if let Some(last) = rows.iter().skip(1).last() {
        let padding = last
            .iter()
            .rev()
            .take_while(|value| value.as_str() == EMPTY_CELL)
            .count();
        // a single-column row has no padding
        if last.len() > 1 {
            values.truncate(values.len() - padding);
        }
    }

    values
}
