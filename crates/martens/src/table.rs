use crate::error::{TableError, TableResult};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};

/// An immutable, column-oriented table.
///
/// Columns are ordered and uniquely named, and every column holds exactly
/// [`record_count`](Table::record_count) values. Operations never modify a table; they
/// return a new one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    data: Vec<Vec<Value>>,
    rows: usize,
}

impl Table {
    /// Build a table from `(name, values)` pairs.
    ///
    /// Fails with [`TableError::DuplicateColumn`] if a name repeats and with
    /// [`TableError::ColumnLengthMismatch`] if the columns differ in length.
    pub fn new<I, K>(columns: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = (K, Vec<Value>)>,
        K: Into<String>,
    {
        let mut names = Vec::new();
        let mut column_index = HashMap::new();
        let mut data = Vec::new();
        let mut rows = None;

        for (name, values) in columns {
            let name = name.into();
            if column_index.contains_key(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            let expected = *rows.get_or_insert(values.len());
            if values.len() != expected {
                return Err(TableError::ColumnLengthMismatch {
                    column: name,
                    expected,
                    actual: values.len(),
                });
            }
            column_index.insert(name.clone(), names.len());
            names.push(name);
            data.push(values);
        }

        Ok(Self {
            columns: names,
            column_index,
            data,
            rows: rows.unwrap_or(0),
        })
    }

    /// Build a table from a sequence of records (key/value pairs).
    ///
    /// The column set is the union of keys over all records, in the order keys are first
    /// seen. Records that lack a key get [`Value::Null`] in that column.
    pub fn from_records<I, R, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let records: Vec<Vec<(String, Value)>> = records
            .into_iter()
            .map(|record| {
                record
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect()
            })
            .collect();

        let mut names: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in &records {
            for (key, _) in record {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }

        let rows = records.len();
        let mut data = vec![vec![Value::Null; rows]; names.len()];
        let mut sparse = 0usize;
        {
            let index: HashMap<&str, usize> = names
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.as_str(), idx))
                .collect();
            for (row, record) in records.into_iter().enumerate() {
                let mut present = HashSet::new();
                for (key, value) in record {
                    let col = index[key.as_str()];
                    present.insert(col);
                    data[col][row] = value;
                }
                if present.len() < names.len() {
                    sparse += 1;
                }
            }
        }
        if sparse > 0 {
            log::warn!("{sparse} of {rows} records are missing columns; filling with null");
        }

        Self::from_validated(names, data, rows)
    }

    /// A single column `name` holding `0..n`.
    pub fn with_ids(n: usize, name: &str) -> Self {
        let ids = (0..n).map(Value::from).collect();
        Self::from_validated(vec![name.to_string()], vec![ids], n)
    }

    /// A table with no columns and no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a table whose shape is already known to be valid.
    pub(crate) fn from_validated(columns: Vec<String>, data: Vec<Vec<Value>>, rows: usize) -> Self {
        debug_assert_eq!(columns.len(), data.len());
        debug_assert!(data.iter().all(|c| c.len() == rows));
        let column_index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.clone(), idx))
            .collect();
        debug_assert_eq!(column_index.len(), columns.len(), "column names must be unique");
        Self {
            columns,
            column_index,
            data,
            rows,
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn record_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.column_index.contains_key(column)
    }

    /// The values of `column`.
    pub fn get(&self, column: &str) -> TableResult<&[Value]> {
        let idx = self.column_idx(column)?;
        Ok(&self.data[idx])
    }

    pub(crate) fn column_idx(&self, column: &str) -> TableResult<usize> {
        self.column_index
            .get(column)
            .copied()
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))
    }

    pub(crate) fn column_by_idx(&self, idx: usize) -> &[Value] {
        &self.data[idx]
    }

    /// Resolve several column names at once, failing on the first unknown one.
    pub(crate) fn resolve<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Vec<usize>> {
        columns.iter().map(|c| self.column_idx(c.as_ref())).collect()
    }

    /// Gather rows by position, moving every column in lockstep.
    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        let data = self
            .data
            .iter()
            .map(|column| indices.iter().map(|&row| column[row].clone()).collect())
            .collect();
        Self::from_validated(self.columns.clone(), data, indices.len())
    }

    /// Take the table apart into `(name, values)` pairs.
    pub(crate) fn into_columns(self) -> Vec<(String, Vec<Value>)> {
        self.columns.into_iter().zip(self.data).collect()
    }

    /// Return a copy with `column` set to `values`.
    ///
    /// An existing column of that name is overwritten in place; otherwise the column is
    /// appended.
    pub(crate) fn with_column(&self, column: &str, values: Vec<Value>) -> TableResult<Self> {
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(TableError::ColumnLengthMismatch {
                column: column.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        let rows = values.len();
        let mut columns = self.columns.clone();
        let mut data = self.data.clone();
        match self.column_index.get(column) {
            Some(&idx) => data[idx] = values,
            None => {
                columns.push(column.to_string());
                data.push(values);
            }
        }
        Ok(Self::from_validated(columns, data, rows))
    }

    /// Lazily iterate over the table's records.
    ///
    /// The iterator borrows the table, so it can be restarted by calling `records` again.
    pub fn records(&self) -> Records<'_> {
        Records {
            table: self,
            next: 0,
        }
    }

    /// Every record as a positional row, in column order.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        (0..self.rows)
            .map(|row| self.data.iter().map(|c| c[row].clone()).collect())
            .collect()
    }

    pub fn first(&self) -> Option<Record<'_>> {
        self.records().next()
    }

    /// Records as maps that omit null cells.
    pub fn records_sparse(&self) -> Vec<BTreeMap<String, Value>> {
        self.records()
            .map(|record| {
                record
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect()
            })
            .collect()
    }

    /// Serialize as a JSON object of columns, keeping column order.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in self.columns.iter().zip(&self.data) {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Iterator returned by [`Table::records`].
#[derive(Clone, Debug)]
pub struct Records<'a> {
    table: &'a Table,
    next: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.rows {
            return None;
        }
        let row = self.next;
        self.next += 1;
        Some(Record {
            table: self.table,
            row,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.rows - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}

/// A view of one row of a [`Table`].
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> Record<'a> {
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.table.column_index.get(column)?;
        self.table.data[*idx].get(self.row)
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let row = self.row;
        self.table
            .columns
            .iter()
            .zip(&self.table.data)
            .map(move |(name, column)| (name.as_str(), &column[row]))
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}
