use crate::error::{TableError, TableResult};
use crate::group::KeyRuns;
use crate::table::Table;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which keys a [`Table::merge`] keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Keys present on both sides.
    #[default]
    Inner,
    /// Every left key; unmatched left records get null right columns.
    Left,
    /// Every right key; unmatched right records get null left columns.
    Right,
    /// Every key from either side.
    Full,
}

impl JoinType {
    /// Whether left records with no matching right key survive.
    pub fn keeps_left_only(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    pub fn keeps_right_only(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
            JoinType::Right => write!(f, "right"),
            JoinType::Full => write!(f, "full"),
        }
    }
}

impl FromStr for JoinType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "full" => Ok(JoinType::Full),
            other => Err(TableError::UnknownJoinType(other.to_string())),
        }
    }
}

/// Output columns of a merge, filled one combined record at a time.
struct MergeOutput<'a> {
    left: &'a Table,
    right: &'a Table,
    left_keys: &'a [usize],
    right_keys: &'a [usize],
    left_rest: &'a [usize],
    right_rest: &'a [usize],
    keys: Vec<Vec<Value>>,
    left_cols: Vec<Vec<Value>>,
    right_cols: Vec<Vec<Value>>,
}

impl<'a> MergeOutput<'a> {
    fn push(&mut self, key_row: KeyRow, left_row: Option<usize>, right_row: Option<usize>) {
        let (table, key_idx, row) = match key_row {
            KeyRow::Left(row) => (self.left, self.left_keys, row),
            KeyRow::Right(row) => (self.right, self.right_keys, row),
        };
        for (out, &idx) in self.keys.iter_mut().zip(key_idx) {
            out.push(table.column_by_idx(idx)[row].clone());
        }
        let (left, right) = (self.left, self.right);
        for (out, &idx) in self.left_cols.iter_mut().zip(self.left_rest) {
            out.push(left_row.map_or(Value::Null, |r| left.column_by_idx(idx)[r].clone()));
        }
        for (out, &idx) in self.right_cols.iter_mut().zip(self.right_rest) {
            out.push(right_row.map_or(Value::Null, |r| right.column_by_idx(idx)[r].clone()));
        }
    }

    /// Cartesian product of two runs; a missing side acts as one all-null record.
    fn push_product(&mut self, left_rows: Option<&[usize]>, right_rows: Option<&[usize]>) {
        match (left_rows, right_rows) {
            (Some(left_rows), Some(right_rows)) => {
                for &l in left_rows {
                    for &r in right_rows {
                        self.push(KeyRow::Left(l), Some(l), Some(r));
                    }
                }
            }
            (Some(left_rows), None) => {
                for &l in left_rows {
                    self.push(KeyRow::Left(l), Some(l), None);
                }
            }
            (None, Some(right_rows)) => {
                for &r in right_rows {
                    self.push(KeyRow::Right(r), None, Some(r));
                }
            }
            (None, None) => {}
        }
    }
}

#[derive(Clone, Copy)]
enum KeyRow {
    Left(usize),
    Right(usize),
}

fn cmp_keys(
    left: &Table,
    left_keys: &[usize],
    left_row: usize,
    right: &Table,
    right_keys: &[usize],
    right_row: usize,
) -> Ordering {
    for (&l, &r) in left_keys.iter().zip(right_keys) {
        let ord = left.column_by_idx(l)[left_row].cmp(&right.column_by_idx(r)[right_row]);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl Table {
    /// Sort-merge equi-join on the columns `on`.
    ///
    /// Both sides are sorted by `on` and walked together one key run at a time, so keys
    /// are emitted in ascending order. For each kept key the output holds the cartesian
    /// product of the matching left and right records; when `how` keeps a key that one
    /// side lacks, that side contributes a single all-null record.
    ///
    /// Output columns are `on`, then the left table's other columns, then the right
    /// table's other columns. Null keys match each other. An empty `on` falls back to
    /// [`Table::full_outer_merge`].
    ///
    /// Fails if an `on` column is missing from either side, or if the two sides share a
    /// column name outside `on`.
    pub fn merge<S: AsRef<str>>(&self, right: &Table, on: &[S], how: JoinType) -> TableResult<Self> {
        if on.is_empty() {
            return self.full_outer_merge(right);
        }

        let left_keys = self.resolve(on)?;
        let right_keys = right.resolve(on)?;
        let on_names: HashSet<&str> = on.iter().map(AsRef::as_ref).collect();
        if on_names.len() != on.len() {
            return Err(TableError::InvalidArgument(
                "merge keys must be distinct".to_string(),
            ));
        }

        let rest = |table: &Table| -> Vec<usize> {
            table
                .column_names()
                .iter()
                .enumerate()
                .filter(|(_, name)| !on_names.contains(name.as_str()))
                .map(|(idx, _)| idx)
                .collect()
        };
        let left_rest = rest(self);
        let right_rest = rest(right);
        let left_names: HashSet<&str> = left_rest
            .iter()
            .map(|&i| self.column_names()[i].as_str())
            .collect();
        if let Some(&clash) = right_rest
            .iter()
            .find(|&&i| left_names.contains(right.column_names()[i].as_str()))
        {
            return Err(TableError::DuplicateColumn(right.column_names()[clash].clone()));
        }

        let left_runs = KeyRuns::new(self, &left_keys);
        let right_runs = KeyRuns::new(right, &right_keys);

        let mut out = MergeOutput {
            left: self,
            right,
            left_keys: &left_keys,
            right_keys: &right_keys,
            left_rest: &left_rest,
            right_rest: &right_rest,
            keys: vec![Vec::new(); left_keys.len()],
            left_cols: vec![Vec::new(); left_rest.len()],
            right_cols: vec![Vec::new(); right_rest.len()],
        };

        let (mut i, mut j) = (0, 0);
        let mut kept = 0usize;
        while i < left_runs.runs.len() || j < right_runs.runs.len() {
            let ord = match (left_runs.runs.get(i), right_runs.runs.get(j)) {
                (Some(l), Some(r)) => cmp_keys(
                    self,
                    &left_keys,
                    left_runs.head(l),
                    right,
                    &right_keys,
                    right_runs.head(r),
                ),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match ord {
                Ordering::Less => {
                    if how.keeps_left_only() {
                        out.push_product(Some(left_runs.rows(&left_runs.runs[i])), None);
                        kept += 1;
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if how.keeps_right_only() {
                        out.push_product(None, Some(right_runs.rows(&right_runs.runs[j])));
                        kept += 1;
                    }
                    j += 1;
                }
                Ordering::Equal => {
                    out.push_product(
                        Some(left_runs.rows(&left_runs.runs[i])),
                        Some(right_runs.rows(&right_runs.runs[j])),
                    );
                    kept += 1;
                    i += 1;
                    j += 1;
                }
            }
        }

        let rows = out.keys.first().map_or(0, Vec::len);
        log::debug!(
            "{how} merge: {} left keys, {} right keys, {kept} kept, {rows} records",
            left_runs.runs.len(),
            right_runs.runs.len()
        );

        let names = on
            .iter()
            .map(|n| n.as_ref().to_string())
            .chain(left_rest.iter().map(|&i| self.column_names()[i].clone()))
            .chain(right_rest.iter().map(|&i| right.column_names()[i].clone()))
            .collect();
        let data = out
            .keys
            .into_iter()
            .chain(out.left_cols)
            .chain(out.right_cols)
            .collect();
        Ok(Self::from_validated(names, data, rows))
    }

    /// Cartesian product of two tables with disjoint column names.
    ///
    /// Every left record is repeated once per right record: the output has
    /// `left.record_count() * right.record_count()` records with the left columns first.
    pub fn full_outer_merge(&self, right: &Table) -> TableResult<Self> {
        if let Some(clash) = right.column_names().iter().find(|c| self.contains(c)) {
            return Err(TableError::DuplicateColumn(clash.clone()));
        }
        let (n, m) = (self.record_count(), right.record_count());
        log::debug!("cartesian merge: {n} x {m} records");

        let mut columns = Vec::with_capacity(self.column_count() + right.column_count());
        for name in self.column_names() {
            let values = self.get(name)?;
            let repeated = values
                .iter()
                .flat_map(|v| std::iter::repeat(v).take(m))
                .cloned()
                .collect();
            columns.push((name.clone(), repeated));
        }
        for name in right.column_names() {
            let values = right.get(name)?;
            let tiled = std::iter::repeat(values)
                .take(n)
                .flat_map(|vs| vs.iter())
                .cloned()
                .collect();
            columns.push((name.clone(), tiled));
        }
        Self::new(columns)
    }

    #[deprecated(note = "use `merge` instead")]
    pub fn merge_by_key(&self, right: &Table, key: &str, how: JoinType) -> TableResult<Self> {
        self.merge(right, &[key], how)
    }
}
