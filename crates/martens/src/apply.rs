use crate::error::{TableError, TableResult};
use crate::reshape::ColumnStackOptions;
use crate::table::Table;
use crate::value::Value;
use std::fmt;

/// A function bound to table columns by name.
///
/// `params` lists the columns whose values are passed to `func`, in order. `name` is the
/// column the `mutate` family writes the result to.
///
/// The shape of `func` depends on the operation it is used with:
///
/// | operation | `func` |
/// |---|---|
/// | [`Table::apply`], [`Table::mutate`], [`Table::filter`] | `Fn(&[&Value]) -> R` (one call per record) |
/// | [`Table::long_apply`], [`Table::long_mutate`] | `Fn(&[&[Value]]) -> R` (one call, whole columns) |
/// | [`Table::window_apply`], [`Table::rolling_apply`] | `Fn(&[Value]) -> R` (single column slices) |
pub struct Func<F> {
    name: String,
    params: Vec<String>,
    pub(crate) func: F,
}

impl<F> Func<F> {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = S>,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub(crate) fn single_param(&self) -> TableResult<&str> {
        match self.params.as_slice() {
            [param] => Ok(param),
            _ => Err(TableError::InvalidArgument(format!(
                "{} must take exactly one column, got {}",
                self.name,
                self.params.len()
            ))),
        }
    }
}

impl<F> fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Call `func` once per record with the record's values for `func.params()`.
    pub fn apply<F, R>(&self, func: &Func<F>) -> TableResult<Vec<R>>
    where
        F: Fn(&[&Value]) -> R,
    {
        let idx = self.resolve(func.params())?;
        let mut args: Vec<&Value> = Vec::with_capacity(idx.len());
        let mut out = Vec::with_capacity(self.record_count());
        for row in 0..self.record_count() {
            args.clear();
            args.extend(idx.iter().map(|&i| &self.column_by_idx(i)[row]));
            out.push((func.func)(&args));
        }
        Ok(out)
    }

    /// Call `func` once with the whole of every parameter column.
    pub fn long_apply<F, R>(&self, func: &Func<F>) -> TableResult<R>
    where
        F: Fn(&[&[Value]]) -> R,
    {
        let columns: Vec<&[Value]> = self
            .resolve(func.params())?
            .into_iter()
            .map(|i| self.column_by_idx(i))
            .collect();
        Ok((func.func)(&columns))
    }

    /// Keep the records for which `func` returns `true`.
    pub fn filter<F>(&self, func: &Func<F>) -> TableResult<Self>
    where
        F: Fn(&[&Value]) -> bool,
    {
        let keep = self.apply(func)?;
        let indices: Vec<usize> = keep
            .into_iter()
            .enumerate()
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect();
        Ok(self.take(&indices))
    }

    /// Add the per-record results of `func` as the column `func.name()`.
    pub fn mutate<F, R>(&self, func: &Func<F>) -> TableResult<Self>
    where
        F: Fn(&[&Value]) -> R,
        R: Into<Value>,
    {
        let values = self.apply(func)?.into_iter().map(Into::into).collect();
        self.with_column(func.name(), values)
    }

    /// Add the column returned by a single whole-column call of `func`.
    ///
    /// The result must hold exactly one value per record.
    pub fn long_mutate<F>(&self, func: &Func<F>) -> TableResult<Self>
    where
        F: Fn(&[&[Value]]) -> Vec<Value>,
    {
        let values = self.long_apply(func)?;
        if values.len() != self.record_count() {
            return Err(TableError::ResultLength {
                expected: self.record_count(),
                actual: values.len(),
            });
        }
        self.with_column(func.name(), values)
    }

    pub fn window_mutate<F, R>(&self, func: &Func<F>, window: usize) -> TableResult<Self>
    where
        F: Fn(&[Value]) -> R,
        R: Into<Value>,
    {
        let values = self
            .window_apply(func, window)?
            .into_iter()
            .map(Into::into)
            .collect();
        self.with_column(func.name(), values)
    }

    /// Add the results of [`Table::rolling_apply`] as a column.
    ///
    /// With `grouping`, results are in group order, so row `i` of the new column belongs
    /// to the `i`-th record of the grouped order rather than record `i`.
    pub fn rolling_mutate<F, R>(&self, func: &Func<F>, grouping: Option<&[&str]>) -> TableResult<Self>
    where
        F: Fn(&[Value]) -> R,
        R: Into<Value>,
    {
        let values = self
            .rolling_apply(func, grouping)?
            .into_iter()
            .map(Into::into)
            .collect();
        self.with_column(func.name(), values)
    }

    /// Fan a fixed-size result per record out into the columns `names`.
    pub fn mutate_stretch<F, S>(&self, func: &Func<F>, names: &[S]) -> TableResult<Self>
    where
        F: Fn(&[&Value]) -> Vec<Value>,
        S: AsRef<str>,
    {
        let results = self.apply(func)?;
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(results.len()); names.len()];
        for result in results {
            if result.len() != names.len() {
                return Err(TableError::ResultLength {
                    expected: names.len(),
                    actual: result.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(result) {
                column.push(value);
            }
        }
        let mut out = self.clone();
        for (name, values) in names.iter().zip(columns) {
            out = out.with_column(name.as_ref(), values)?;
        }
        Ok(out)
    }

    /// Add a variable-length result per record, one output record per element.
    ///
    /// Every other column is repeated once per element (see [`Table::column_stack`]).
    /// The elements land in `options.new_name`, defaulting to `func.name()`.
    pub fn mutate_stack<F>(&self, func: &Func<F>, options: &ColumnStackOptions) -> TableResult<Self>
    where
        F: Fn(&[&Value]) -> Vec<Value>,
    {
        let target = options.new_name.as_deref().unwrap_or(func.name());
        let lists = self.apply(func)?.into_iter().map(Value::List).collect();
        let options = ColumnStackOptions {
            new_name: None,
            ..options.clone()
        };
        self.with_column(target, lists)?.column_stack(target, &options)
    }
}
