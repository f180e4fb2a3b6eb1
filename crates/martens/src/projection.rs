use crate::error::{TableError, TableResult};
use crate::table::Table;
use crate::value::Value;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Direction for [`Table::sort`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Column selection for [`Table::replace`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Columns {
    /// Exactly these columns.
    Only(Vec<String>),
    /// Every column except these.
    Except(Vec<String>),
}

impl Columns {
    pub fn only<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Columns::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn except<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Columns::Except(names.into_iter().map(Into::into).collect())
    }
}

/// Compare two rows by the given key columns.
pub(crate) fn cmp_rows(table: &Table, keys: &[usize], a: usize, b: usize) -> Ordering {
    for &key in keys {
        let column = table.column_by_idx(key);
        let ord = column[a].cmp(&column[b]);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Row positions of `table` in stable key order.
pub(crate) fn sorted_indices(table: &Table, keys: &[usize], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..table.record_count()).collect();
    // `sort_by` is stable; reversing only the comparison keeps ties in input order.
    indices.sort_by(|&a, &b| {
        let ord = cmp_rows(table, keys, a, b);
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
    indices
}

/// Resolve Python-style slice bounds into row positions.
fn slice_indices(
    len: usize,
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
) -> TableResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(TableError::InvalidArgument(
            "slice step cannot be zero".to_string(),
        ));
    }
    let len = len as isize;
    let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
    let clamp = |bound: isize| {
        if bound < 0 {
            (bound + len).max(lower)
        } else {
            bound.min(upper)
        }
    };
    let start = start.map_or(if step > 0 { lower } else { upper }, clamp);
    let stop = stop.map_or(if step > 0 { upper } else { lower }, clamp);

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(i as usize);
        i += step;
    }
    Ok(out)
}

fn camel_to_snake(name: &str) -> String {
    static UPPER_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = UPPER_RE.get_or_init(|| Regex::new(r"[A-Z]").expect("valid regex"));
    let mut out = String::with_capacity(name.len() + 4);
    let mut last = 0;
    for m in re.find_iter(name) {
        out.push_str(&name[last..m.start()]);
        if m.start() > 0 {
            out.push('_');
        }
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&name[last..]);
    out.to_lowercase()
}

impl Table {
    /// Keep only `columns`, in the requested order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Self> {
        let indices = self.resolve(columns)?;
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, idx) in columns.iter().zip(indices) {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(TableError::DuplicateColumn(name.to_string()));
            }
            names.push(name.to_string());
            data.push(self.column_by_idx(idx).to_vec());
        }
        Ok(Self::from_validated(names, data, self.record_count()))
    }

    /// Remove `columns`, keeping the remaining ones in their original order.
    ///
    /// Names that are not present are ignored.
    pub fn drop<S: AsRef<str>>(&self, columns: &[S]) -> Self {
        let dropped: HashSet<&str> = columns.iter().map(AsRef::as_ref).collect();
        let (names, data): (Vec<String>, Vec<Vec<Value>>) = self
            .column_names()
            .iter()
            .enumerate()
            .filter(|(_, name)| !dropped.contains(name.as_str()))
            .map(|(idx, name)| (name.clone(), self.column_by_idx(idx).to_vec()))
            .unzip();
        Self::from_validated(names, data, self.record_count())
    }

    /// Rename columns through `(old, new)` pairs; other columns pass through.
    ///
    /// Pairs whose old name is absent are ignored. Fails if the result would contain the
    /// same name twice.
    pub fn rename<I, K, V>(&self, renames: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let renames: Vec<(K, V)> = renames.into_iter().collect();
        let lookup = |name: &str| {
            renames
                .iter()
                .find(|(old, _)| old.as_ref() == name)
                .map_or(name, |(_, new)| new.as_ref())
                .to_string()
        };
        let columns = self
            .column_names()
            .iter()
            .enumerate()
            .map(|(idx, name)| (lookup(name), self.column_by_idx(idx).to_vec()));
        Self::new(columns)
    }

    /// Keep only the columns named in `(old, new)` pairs, renamed, in pair order.
    pub fn rename_and_select<I, K, V>(&self, renames: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut columns = Vec::new();
        for (old, new) in renames {
            columns.push((new.into(), self.get(old.as_ref())?.to_vec()));
        }
        Self::new(columns)
    }

    /// Apply the same positional slice to every column.
    ///
    /// Bounds follow half-open slice semantics: negative values count from the end,
    /// omitted values default to the whole range, and a negative `step` walks backwards.
    pub fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    ) -> TableResult<Self> {
        let indices = slice_indices(self.record_count(), start, stop, step)?;
        Ok(self.take(&indices))
    }

    /// Stable sort of all records by the tuple of `keys`.
    ///
    /// Records with equal keys keep their original relative order in both directions.
    /// Column order is unchanged. Values order as documented on [`Value`].
    pub fn sort<S: AsRef<str>>(&self, keys: &[S], order: SortOrder) -> TableResult<Self> {
        let key_idx = self.resolve(keys)?;
        let indices = sorted_indices(self, &key_idx, order);
        Ok(self.take(&indices))
    }

    /// Keep records whose `column` equals `value`.
    pub fn filter_eq(&self, column: &str, value: &Value) -> TableResult<Self> {
        let indices: Vec<usize> = self
            .get(column)?
            .iter()
            .enumerate()
            .filter(|(_, v)| *v == value)
            .map(|(row, _)| row)
            .collect();
        Ok(self.take(&indices))
    }

    /// Replace every null cell with `value`.
    pub fn fill_null(&self, value: &Value) -> Self {
        let data = (0..self.column_count())
            .map(|idx| {
                self.column_by_idx(idx)
                    .iter()
                    .map(|v| if v.is_null() { value.clone() } else { v.clone() })
                    .collect()
            })
            .collect();
        Self::from_validated(self.column_names().to_vec(), data, self.record_count())
    }

    /// Add (or overwrite) `name` with the record positions `0..n`.
    pub fn with_id(&self, name: &str) -> TableResult<Self> {
        let ids = (0..self.record_count()).map(Value::from).collect();
        self.with_column(name, ids)
    }

    /// Add (or overwrite) `name` holding `value` in every record.
    pub fn with_constant(&self, name: &str, value: Value) -> TableResult<Self> {
        self.with_column(name, vec![value; self.record_count()])
    }

    pub fn with_constants<I, K>(&self, constants: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut out = self.clone();
        for (name, value) in constants {
            out = out.with_constant(name.as_ref(), value)?;
        }
        Ok(out)
    }

    /// Map `func` over every cell of the selected columns.
    pub fn replace<F>(&self, func: F, columns: &Columns) -> TableResult<Self>
    where
        F: Fn(&Value) -> Value,
    {
        let targets: Vec<String> = match columns {
            Columns::Only(names) => {
                self.resolve(names)?;
                names.clone()
            }
            Columns::Except(names) => self
                .column_names()
                .iter()
                .filter(|c| !names.contains(*c))
                .cloned()
                .collect(),
        };
        let mut out = self.clone();
        for name in &targets {
            let values = self.get(name)?.iter().map(&func).collect();
            out = out.with_column(name, values)?;
        }
        Ok(out)
    }

    /// Lower-case every column name.
    pub fn headings_lower(&self) -> TableResult<Self> {
        self.map_names(|name| name.to_lowercase())
    }

    /// Convert `camelCase` column names to `snake_case`.
    pub fn headings_camel_to_snake(&self) -> TableResult<Self> {
        self.map_names(camel_to_snake)
    }

    fn map_names(&self, rename: impl Fn(&str) -> String) -> TableResult<Self> {
        let columns = self
            .column_names()
            .iter()
            .enumerate()
            .map(|(idx, name)| (rename(name), self.column_by_idx(idx).to_vec()));
        Self::new(columns)
    }
}
