use martens::{SortOrder, Table, Value};
use martens_io::{render, write_csv_path, IoError, SourceFile, SourceOptions};
use pretty_assertions::assert_eq;

#[test]
fn written_csv_reads_back_with_dates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    let date = chrono_date(2024, 3, 9);
    let table = Table::new(vec![
        ("order_id", vec![Value::from(2), Value::from(1)]),
        ("shipped", vec![Value::from(date), Value::Null]),
        ("note", vec![Value::from("fragile, glass"), Value::from("")]),
    ])
    .unwrap();
    write_csv_path(&table, &path).unwrap();

    let options = SourceOptions::default().with_date_columns(["shipped"]);
    let back = SourceFile::new(&path, options).table().unwrap();
    assert_eq!(back.column_names(), ["order_id", "shipped", "note"]);
    assert_eq!(back.get("order_id").unwrap(), table.get("order_id").unwrap());
    assert_eq!(back.get("shipped").unwrap(), table.get("shipped").unwrap());
    // Empty text and null are indistinguishable once written.
    assert_eq!(
        back.get("note").unwrap(),
        [Value::from("fragile, glass"), Value::Null]
    );

    let sorted = back.sort(&["order_id"], SortOrder::Ascending).unwrap();
    assert_eq!(
        render(&sorted),
        "|order_id |shipped    |note           |\n\
         |1        |           |               |\n\
         |2        |2024-03-09 |fragile, glass |\n"
    );
}

#[test]
fn headers_are_sanitised_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.CSV");
    std::fs::write(&path, "Unit Price,Growth %\n3,4\n").unwrap();

    let table = SourceFile::new(&path, SourceOptions::default()).table().unwrap();
    assert_eq!(table.column_names(), ["Unit_Price", "Growth_pct"]);

    let raw = SourceOptions {
        sanitise_names: false,
        ..SourceOptions::default()
    };
    let table = SourceFile::new(&path, raw).csv().unwrap();
    assert_eq!(table.column_names(), ["Unit Price", "Growth %"]);
}

#[test]
fn unknown_extensions_and_missing_files_fail() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = SourceFile::new(dir.path().join("book.xlsx"), SourceOptions::default());
    assert!(matches!(xlsx.table(), Err(IoError::UnsupportedFormat(ext)) if ext == "xlsx"));

    let missing = SourceFile::new(dir.path().join("missing.csv"), SourceOptions::default());
    assert!(matches!(missing.table(), Err(IoError::Io(_))));
}

fn chrono_date(year: i32, month: u32, day: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
