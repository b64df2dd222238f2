use knowmyslots::downloader::{self, EMPTY_CELL, ExportFormat, Layout, MAX_CELL_CHARS, Table};
use knowmyslots::group::{Group, GroupKey, PdfEntry};
use knowmyslots::loader;

fn values(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("user{i}@x.com")).collect()
}

#[test]
fn test_csv_column_round_trip() {
    let mut input = values(7);
    input.push("quoted \"name\", with comma".to_string());

    let table = Table::from_values("Emails", "Email", &input, Layout::Column);
    let csv = downloader::to_csv(&table);
    let rows = loader::from_csv(&csv).unwrap();

    assert_eq!(rows[0], vec!["Email"]);
    assert_eq!(loader::values_from_rows(&rows), input);
}

#[test]
fn test_xlsx_column_round_trip() {
    let input = values(12);

    let table = Table::from_values("Contacts", "Contact", &input, Layout::Column);
    let bytes = downloader::render(&table, ExportFormat::Xlsx).unwrap();
    let rows = loader::from_xlsx(&bytes).unwrap();

    assert_eq!(rows.len(), 13);
    assert_eq!(loader::values_from_rows(&rows), input);
}

#[test]
fn test_grid_pads_last_row() {
    let input = values(23);

    let table = Table::from_values("Contacts", "Contact", &input, Layout::Grid(10));

    assert_eq!(table.headers.len(), 10);
    assert_eq!(table.headers[0], "Contact 1");
    assert_eq!(table.headers[9], "Contact 10");
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[2][2], "user22@x.com");
    assert!(table.rows[2][3..].iter().all(|cell| cell == EMPTY_CELL));

    let rows = loader::from_csv(&downloader::to_csv(&table)).unwrap();
    assert_eq!(loader::values_from_rows(&rows), input);
}

#[test]
fn test_group_rows() {
    let groups = vec![
        Group::new(
            GroupKey::new("2024", Some("2024 Spring".into()), "Agents"),
            vec!["a@x.com".to_string(), "b@x.com".to_string()],
        ),
        Group::new(GroupKey::new("2024", Some("2024 Fall".into()), "Empty"), Vec::new()),
    ];

    let table = Table::from_groups("Contacts", "Contacts", &groups, true);
    assert_eq!(table.headers, vec!["Year", "Season", "Label", "Contacts"]);
    assert_eq!(table.rows[0], vec!["2024", "2024 Spring", "Agents", "a@x.com, b@x.com"]);
    assert_eq!(table.rows[1][3], EMPTY_CELL);

    let links = Table::from_groups("Links", "Links", &groups, false);
    assert_eq!(links.headers, vec!["Year", "Label", "Links"]);
}

#[test]
fn test_pdf_rows() {
    let groups = vec![Group::new(
        GroupKey::yearly("2024", "Forms"),
        vec![
            PdfEntry::new("/uploads/a.pdf", "Form A"),
            PdfEntry::new("/uploads/b.pdf", ""),
        ],
    )];

    let table = Table::from_pdfs(&groups);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0], vec!["2024", "Forms", "/uploads/a.pdf", "Form A"]);
    assert_eq!(table.rows[1][3], EMPTY_CELL);
}

#[test]
fn test_format_query() {
    assert_eq!(ExportFormat::from_query(None).unwrap(), ExportFormat::Xlsx);
    assert_eq!(ExportFormat::from_query(Some(" CSV ")).unwrap(), ExportFormat::Csv);
    assert!(ExportFormat::from_query(Some("pdf")).is_err());
}

#[test]
fn test_unterminated_quote_is_an_error() {
    assert!(loader::from_csv("Email\n\"broken\n").is_err());
}

#[test]
fn test_large_group_splits_across_rows() {
    let input: Vec<String> = (0..2000).map(|i| format!("user{i:05}@example.com")).collect();
    let groups = vec![Group::new(
        GroupKey::new("2024", Some("2024 Spring".into()), "Agents"),
        input.clone(),
    )];

    let table = Table::from_groups("Contacts", "Contacts", &groups, true);
    assert!(table.rows.len() > 1);
    for row in &table.rows {
        assert_eq!(row[..3], ["2024", "2024 Spring", "Agents"]);
        assert!(row[3].chars().count() <= MAX_CELL_CHARS);
    }

    let bytes = downloader::render(&table, ExportFormat::Xlsx).unwrap();
    let rows = loader::from_xlsx(&bytes).unwrap();
    let values: Vec<String> = rows
        .iter()
        .skip(1)
        .flat_map(|row| row[3].split(", ").map(String::from).collect::<Vec<_>>())
        .collect();
    assert_eq!(values, input);
}

#[test]
fn test_join_within_limit_splits_long_values() {
    let long = "x".repeat(25);

    let chunks = downloader::join_within_limit(&["ab", &long, "cd"], 10);
    assert_eq!(chunks, vec!["ab", "xxxxxxxxxx", "xxxxxxxxxx", "xxxxx", "cd"]);
}

#[test]
fn test_oversized_single_cell_is_clipped_in_xlsx() {
    let input = vec!["y".repeat(MAX_CELL_CHARS + 10)];
    let table = Table::from_values("Links", "Link", &input, Layout::Column);

    let bytes = downloader::render(&table, ExportFormat::Xlsx).unwrap();
    let rows = loader::from_xlsx(&bytes).unwrap();
    assert_eq!(rows[1][0].chars().count(), MAX_CELL_CHARS);
}

#[test]
fn test_csv_keeps_carriage_returns_and_literal_na() {
    let input = vec![
        "https://a.example/x\ry".to_string(),
        EMPTY_CELL.to_string(),
        "last".to_string(),
    ];

    let table = Table::from_values("Links", "Link", &input, Layout::Column);
    let csv = downloader::to_csv(&table);
    assert!(csv.contains("\"https://a.example/x\ry\""));

    let rows = loader::from_csv(&csv).unwrap();
    assert_eq!(loader::values_from_rows(&rows), input);
}

#[test]
fn test_grid_keeps_literal_na_before_padding() {
    let input = vec![
        "a@x.com".to_string(),
        EMPTY_CELL.to_string(),
        "b@x.com".to_string(),
    ];

    let table = Table::from_values("Contacts", "Contact", &input, Layout::Grid(2));
    let rows = loader::from_csv(&downloader::to_csv(&table)).unwrap();
    assert_eq!(loader::values_from_rows(&rows), input);
}
