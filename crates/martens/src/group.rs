use crate::apply::Func;
use crate::error::{TableError, TableResult};
use crate::projection::{cmp_rows, sorted_indices, SortOrder};
use crate::table::Table;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Range;

/// Rows of a table in stable key order, split into runs of equal keys.
#[derive(Debug)]
pub(crate) struct KeyRuns {
    pub(crate) order: Vec<usize>,
    pub(crate) runs: Vec<Range<usize>>,
}

impl KeyRuns {
    pub(crate) fn new(table: &Table, keys: &[usize]) -> Self {
        let order = sorted_indices(table, keys, SortOrder::Ascending);
        let mut runs = Vec::new();
        let mut start = 0;
        for pos in 1..=order.len() {
            if pos == order.len()
                || cmp_rows(table, keys, order[start], order[pos]) != Ordering::Equal
            {
                runs.push(start..pos);
                start = pos;
            }
        }
        log::trace!("{} rows split into {} key runs", order.len(), runs.len());
        Self { order, runs }
    }

    /// The original row positions that make up `run`.
    pub(crate) fn rows(&self, run: &Range<usize>) -> &[usize] {
        &self.order[run.clone()]
    }

    /// Position of the first row of `run`; every row of the run shares its key.
    pub(crate) fn head(&self, run: &Range<usize>) -> usize {
        self.order[run.start]
    }
}

impl Table {
    /// Collapse records that share a grouping key into one record per key.
    ///
    /// Records are sorted by `grouping` (stably) and each run of equal keys becomes one
    /// output record: grouping columns hold the key, every column in `other` (default:
    /// all non-grouping columns) holds a [`Value::List`] of the run's values in their
    /// original order, and `count`, when given, names a column holding the run length.
    pub fn group_by<S: AsRef<str>>(
        &self,
        grouping: &[S],
        other: Option<&[S]>,
        count: Option<&str>,
    ) -> TableResult<Self> {
        if grouping.is_empty() {
            return Err(TableError::InvalidArgument(
                "group_by needs at least one grouping column".to_string(),
            ));
        }
        let key_idx = self.resolve(grouping)?;
        let other_names: Vec<String> = match other {
            Some(names) => names.iter().map(|n| n.as_ref().to_string()).collect(),
            None => self
                .column_names()
                .iter()
                .filter(|c| !grouping.iter().any(|g| g.as_ref() == c.as_str()))
                .cloned()
                .collect(),
        };
        let other_idx = self.resolve(&other_names)?;

        let runs = KeyRuns::new(self, &key_idx);
        let groups = runs.runs.len();

        let mut keys: Vec<Vec<Value>> = vec![Vec::with_capacity(groups); key_idx.len()];
        let mut lists: Vec<Vec<Value>> = vec![Vec::with_capacity(groups); other_idx.len()];
        let mut counts = Vec::with_capacity(groups);
        for run in &runs.runs {
            let rows = runs.rows(run);
            let head = runs.head(run);
            for (out, &idx) in keys.iter_mut().zip(&key_idx) {
                out.push(self.column_by_idx(idx)[head].clone());
            }
            for (out, &idx) in lists.iter_mut().zip(&other_idx) {
                let column = self.column_by_idx(idx);
                out.push(Value::List(
                    rows.iter().map(|&row| column[row].clone()).collect(),
                ));
            }
            counts.push(Value::from(rows.len()));
        }
        log::debug!("group_by: {} records into {groups} groups", self.record_count());

        let mut columns: Vec<(String, Vec<Value>)> = grouping
            .iter()
            .map(|g| g.as_ref().to_string())
            .zip(keys)
            .chain(other_names.into_iter().zip(lists))
            .collect();
        if let Some(count) = count {
            columns.push((count.to_string(), counts));
        }
        Self::new(columns)
    }

    /// Distinct tuples of `columns`, in ascending order.
    pub fn unique_by<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Self> {
        if columns.is_empty() {
            return Err(TableError::InvalidArgument(
                "unique_by needs at least one column".to_string(),
            ));
        }
        let idx = self.resolve(columns)?;
        let distinct: BTreeSet<Vec<Value>> = (0..self.record_count())
            .map(|row| {
                idx.iter()
                    .map(|&i| self.column_by_idx(i)[row].clone())
                    .collect()
            })
            .collect();

        let mut data: Vec<Vec<Value>> = vec![Vec::with_capacity(distinct.len()); idx.len()];
        for tuple in distinct {
            for (out, value) in data.iter_mut().zip(tuple) {
                out.push(value);
            }
        }
        Self::new(
            columns
                .iter()
                .map(|c| c.as_ref().to_string())
                .zip(data),
        )
    }

    /// Call `func` on the trailing window of up to `window` values ending at each record.
    ///
    /// `func` must declare exactly one parameter column. Early records see shorter
    /// windows; nothing is padded.
    pub fn window_apply<F, R>(&self, func: &Func<F>, window: usize) -> TableResult<Vec<R>>
    where
        F: Fn(&[Value]) -> R,
    {
        if window == 0 {
            return Err(TableError::InvalidArgument(
                "window must be at least 1".to_string(),
            ));
        }
        let column = self.get(func.single_param()?)?;
        Ok((0..column.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(window);
                (func.func)(&column[start..=i])
            })
            .collect())
    }

    /// Call `func` on the growing prefix of a column.
    ///
    /// Without `grouping` the prefixes run over the column in record order. With
    /// `grouping` the column is first grouped (see [`Table::group_by`]), prefixes restart
    /// in every group, and results come out group by group in ascending key order. That
    /// is not the input record order unless the input was already sorted by the key.
    pub fn rolling_apply<F, R>(&self, func: &Func<F>, grouping: Option<&[&str]>) -> TableResult<Vec<R>>
    where
        F: Fn(&[Value]) -> R,
    {
        let name = func.single_param()?;
        match grouping {
            None => {
                let column = self.get(name)?;
                Ok((0..column.len())
                    .map(|i| (func.func)(&column[..=i]))
                    .collect())
            }
            Some(grouping) => {
                let grouped = self.group_by(grouping, Some(&[name][..]), None)?;
                let mut out = Vec::with_capacity(self.record_count());
                for cell in grouped.get(name)? {
                    let values = cell.as_list().unwrap_or_default();
                    for i in 0..values.len() {
                        out.push((func.func)(&values[..=i]));
                    }
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg;
    use pretty_assertions::assert_eq;

    fn numbers(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    #[test]
    fn groups_collect_lists_in_key_order() {
        let table = Table::new(vec![
            ("id", numbers(&[1, 1, 2])),
            ("x", numbers(&[10, 20, 30])),
        ])
        .unwrap();
        let out = table.group_by(&["id"], Some(&["x"][..]), None).unwrap();
        let expected = Table::new(vec![
            ("id", numbers(&[1, 2])),
            (
                "x",
                vec![
                    Value::List(numbers(&[10, 20])),
                    Value::List(numbers(&[30])),
                ],
            ),
        ])
        .unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn count_column_sums_to_record_count() {
        let table = Table::new(vec![
            ("k", vec!["b", "a", "b", "c", "b"].into_iter().map(Value::from).collect()),
            ("v", numbers(&[1, 2, 3, 4, 5])),
        ])
        .unwrap();
        let out = table.group_by(&["k"], None, Some("n")).unwrap();
        assert_eq!(out.column_names(), ["k", "v", "n"]);
        assert_eq!(out.get("n").unwrap(), numbers(&[1, 3, 1]));
        assert_eq!(
            out.get("v").unwrap()[1],
            Value::List(numbers(&[1, 3, 5]))
        );
    }

    #[test]
    fn group_by_requires_grouping_columns() {
        let table = Table::new(vec![("k", numbers(&[1]))]).unwrap();
        let none: [&str; 0] = [];
        assert!(matches!(
            table.group_by(&none, None, None),
            Err(TableError::InvalidArgument(_))
        ));
        assert_eq!(
            table.group_by(&["missing"], None, None).unwrap_err(),
            TableError::UnknownColumn("missing".to_string())
        );
    }

    #[test]
    fn unique_by_sorts_distinct_tuples() {
        let table = Table::new(vec![
            ("a", numbers(&[2, 1, 2, 1])),
            ("b", numbers(&[0, 5, 0, 4])),
            ("c", numbers(&[9, 9, 9, 9])),
        ])
        .unwrap();
        let out = table.unique_by(&["a", "b"]).unwrap();
        assert_eq!(out.column_names(), ["a", "b"]);
        assert_eq!(out.get("a").unwrap(), numbers(&[1, 1, 2]));
        assert_eq!(out.get("b").unwrap(), numbers(&[4, 5, 0]));
    }

    #[test]
    fn window_apply_uses_trailing_windows() {
        let table = Table::new(vec![("v", numbers(&[1, 2, 3, 4]))]).unwrap();
        let func = Func::new("total", ["v"], agg::sum);
        let out = table.window_apply(&func, 2).unwrap();
        assert_eq!(out, numbers(&[1, 3, 5, 7]));
        assert!(table.window_apply(&func, 0).is_err());
    }

    #[test]
    fn rolling_apply_restarts_per_group() {
        let table = Table::new(vec![
            ("g", numbers(&[2, 1, 2, 1])),
            ("v", numbers(&[1, 10, 2, 20])),
        ])
        .unwrap();
        let func = Func::new("running", ["v"], agg::sum);
        assert_eq!(
            table.rolling_apply(&func, None).unwrap(),
            numbers(&[1, 11, 13, 33])
        );
        // Grouped results come out in key order: group 1 first, then group 2.
        assert_eq!(
            table.rolling_apply(&func, Some(&["g"][..])).unwrap(),
            numbers(&[10, 30, 1, 3])
        );
    }

    #[test]
    fn window_functions_take_one_column() {
        let table = Table::new(vec![("a", numbers(&[1])), ("b", numbers(&[1]))]).unwrap();
        let func = Func::new("pair", ["a", "b"], agg::sum);
        assert!(matches!(
            table.rolling_apply(&func, None),
            Err(TableError::InvalidArgument(_))
        ));
    }
}
