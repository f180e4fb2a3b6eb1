use crate::error::{IoError, IoResult};
use crate::range::parse_range;
use chrono::NaiveDate;
use martens::{Table, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Which part of a source to read and how to interpret it.
///
/// Rows and columns are 1-based. `from_row` is the header row; data starts on the row
/// below it and runs through `to_row` (inclusive) or the end of the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceOptions {
    pub from_row: usize,
    pub from_col: usize,
    pub to_row: Option<usize>,
    pub to_col: Option<usize>,
    /// Columns (by their final, possibly sanitised, name) parsed as dates.
    pub date_columns: Vec<String>,
    /// `chrono` format used for `date_columns`.
    pub date_format: String,
    pub delimiter: u8,
    /// Pass header cells through [`sanitise_column_name`].
    pub sanitise_names: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            from_row: 1,
            from_col: 1,
            to_row: None,
            to_col: None,
            date_columns: Vec::new(),
            date_format: "%Y-%m-%d".to_string(),
            delimiter: b',',
            sanitise_names: true,
        }
    }
}

impl SourceOptions {
    /// Restrict reading to a spreadsheet-style range such as `"B2:D10"`.
    pub fn with_range(self, range: &str) -> IoResult<Self> {
        let range = parse_range(range)?;
        Ok(Self {
            from_row: range.from_row,
            from_col: range.from_col,
            to_row: Some(range.to_row),
            to_col: Some(range.to_col),
            ..self
        })
    }

    pub fn with_date_columns<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            date_columns: columns.into_iter().map(Into::into).collect(),
            ..self
        }
    }
}

/// A tabular file on disk, read according to its extension.
#[derive(Clone, Debug)]
pub struct SourceFile {
    path: PathBuf,
    options: SourceOptions,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, options: SourceOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, dispatching on its extension.
    pub fn table(&self) -> IoResult<Table> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => self.csv(),
            Some(other) => Err(IoError::UnsupportedFormat(other.to_string())),
            None => Err(IoError::UnsupportedFormat(String::new())),
        }
    }

    /// Read the file as CSV regardless of its extension.
    pub fn csv(&self) -> IoResult<Table> {
        let file = File::open(&self.path)?;
        log::debug!("reading csv {}", self.path.display());
        read_csv(BufReader::new(file), &self.options)
    }
}

/// Read a CSV stream into a table.
///
/// Empty cells become null. Cells in `options.date_columns` are parsed with
/// `options.date_format`, and other cells that parse as finite numbers become numbers;
/// everything else stays text. Short rows are padded with nulls.
pub fn read_csv<R: Read>(reader: R, options: &SourceOptions) -> IoResult<Table> {
    if options.from_row == 0 || options.from_col == 0 {
        return Err(IoError::InvalidRange(format!(
            "row {} column {}",
            options.from_row, options.from_col
        )));
    }
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    for _ in 1..options.from_row {
        if records.next().transpose()?.is_none() {
            return Err(IoError::EmptyInput);
        }
    }
    let header = records.next().transpose()?.ok_or(IoError::EmptyInput)?;

    let first = options.from_col - 1;
    let last = options.to_col.unwrap_or(header.len()).min(header.len());
    let names: Vec<String> = (first..last)
        .map(|i| {
            let raw = header.get(i).unwrap_or_default();
            if options.sanitise_names {
                sanitise_column_name(raw)
            } else {
                raw.to_string()
            }
        })
        .collect();
    let is_date: Vec<bool> = names
        .iter()
        .map(|name| options.date_columns.contains(name))
        .collect();

    let limit = options
        .to_row
        .map_or(usize::MAX, |to| to.saturating_sub(options.from_row));
    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    let mut ragged = 0usize;
    for record in records.take(limit) {
        let record = record?;
        if record.len() < last {
            ragged += 1;
        }
        for (offset, column) in columns.iter_mut().enumerate() {
            let raw = record.get(first + offset).unwrap_or_default();
            column.push(parse_cell(raw, is_date[offset], &options.date_format));
        }
    }
    if ragged > 0 {
        log::warn!("{ragged} csv rows were shorter than the header; padded with null");
    }

    Ok(Table::new(names.into_iter().zip(columns))?)
}

fn parse_cell(raw: &str, is_date: bool, date_format: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if is_date {
        return match NaiveDate::parse_from_str(raw.trim(), date_format) {
            Ok(date) => Value::from(date),
            Err(_) => {
                log::debug!("{raw:?} does not match date format {date_format:?}");
                Value::from(raw)
            }
        };
    }
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Value::from(n),
        _ => Value::from(raw),
    }
}

/// Turn a free-form header into an identifier-like column name.
///
/// Spaces, dots, dashes and opening parentheses become `_`; `%` and `+` are spelt out;
/// quotes, colons, closing parentheses and byte-order marks are removed.
pub fn sanitise_column_name(name: &str) -> String {
    const REPLACEMENTS: [(char, &str); 11] = [
        (':', ""),
        (' ', "_"),
        (')', ""),
        ('(', "_"),
        ('.', "_"),
        ('\'', ""),
        ('%', "pct"),
        ('+', "plus"),
        ('-', "_"),
        ('\u{feff}', ""),
        ('"', ""),
    ];
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => out.push_str(to),
            None => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(values: &[&str]) -> Vec<Value> {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    #[test]
    fn sanitises_headers() {
        assert_eq!(sanitise_column_name("\u{feff}Unit Price (EUR)"), "Unit_Price__EUR");
        assert_eq!(sanitise_column_name("growth %"), "growth_pct");
        assert_eq!(sanitise_column_name("a+b-c.d:'e'\"f\""), "aplusb_c_def");
    }

    #[test]
    fn reads_typed_cells() {
        let input = "Name,Score,Joined\nann,1.5,2024-01-31\nbo,,2023-12-01\ncy,n/a,soon\n";
        let options = SourceOptions::default().with_date_columns(["Joined"]);
        let table = read_csv(input.as_bytes(), &options).unwrap();

        assert_eq!(table.column_names(), ["Name", "Score", "Joined"]);
        assert_eq!(
            table.get("Score").unwrap(),
            [Value::from(1.5), Value::Null, Value::from("n/a")]
        );
        assert_eq!(
            table.get("Joined").unwrap(),
            [
                Value::from(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
                Value::from(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()),
                Value::from("soon"),
            ]
        );
    }

    #[test]
    fn reads_a_window() {
        let input = "title,,\n,a,b,c\n,1,2,3\n,4,5,6\n,7,8,9\n";
        let options = SourceOptions::default().with_range("B2:C4").unwrap();
        let table = read_csv(input.as_bytes(), &options).unwrap();

        assert_eq!(table.column_names(), ["a", "b"]);
        assert_eq!(table.get("a").unwrap(), [Value::from(1), Value::from(4)]);
        assert_eq!(table.get("b").unwrap(), [Value::from(2), Value::from(5)]);
    }

    #[test]
    fn pads_short_rows() {
        let input = "a;b\nx\n";
        let options = SourceOptions {
            delimiter: b';',
            ..SourceOptions::default()
        };
        let table = read_csv(input.as_bytes(), &options).unwrap();
        assert_eq!(table.get("a").unwrap(), text(&["x"]));
        assert_eq!(table.get("b").unwrap(), [Value::Null]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            read_csv("".as_bytes(), &SourceOptions::default()),
            Err(IoError::EmptyInput)
        ));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = read_csv("a,a\n1,2\n".as_bytes(), &SourceOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Table(martens::TableError::DuplicateColumn(_))));
    }
}
