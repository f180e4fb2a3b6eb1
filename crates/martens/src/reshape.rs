use crate::error::{TableError, TableResult};
use crate::table::Table;
use crate::value::Value;
use std::collections::{BTreeSet, HashSet};

/// Options for [`Table::column_stack`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnStackOptions {
    /// Name of the flattened column; defaults to the source column's name.
    pub new_name: Option<String>,
    /// If set, a column holding the length of each element's source list.
    pub save_len: Option<String>,
    /// If set, a column holding each element's position within its source list.
    pub enumeration: Option<String>,
}

/// The nesting shape shared by every cell of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellShape {
    /// Maps, possibly with nulls mixed in.
    Map,
    /// Lists only.
    List,
    /// No maps or lists at all.
    Scalar,
}

fn cell_shape(column: &str, values: &[Value]) -> TableResult<CellShape> {
    let (mut maps, mut lists, mut nulls) = (0, 0, 0);
    for value in values {
        match value {
            Value::Map(_) => maps += 1,
            Value::List(_) => lists += 1,
            Value::Null => nulls += 1,
            _ => {}
        }
    }
    if maps > 0 && maps + nulls == values.len() {
        Ok(CellShape::Map)
    } else if lists > 0 && lists == values.len() {
        Ok(CellShape::List)
    } else if maps == 0 && lists == 0 {
        Ok(CellShape::Scalar)
    } else {
        Err(TableError::TypeMismatch {
            column: column.to_string(),
            expected: "uniform map or list",
            found: "mixed",
        })
    }
}

/// Concatenate tables that share the same column names.
///
/// Columns come out in the first table's order; the other tables may list the same names
/// in any order.
pub fn stack(tables: &[Table]) -> TableResult<Table> {
    let Some(first) = tables.first() else {
        return Err(TableError::InvalidArgument(
            "stack needs at least one table".to_string(),
        ));
    };
    let expected: BTreeSet<&String> = first.column_names().iter().collect();
    for table in &tables[1..] {
        let actual: BTreeSet<&String> = table.column_names().iter().collect();
        if actual != expected {
            return Err(TableError::ColumnSetMismatch {
                expected: first.column_names().to_vec(),
                actual: table.column_names().to_vec(),
            });
        }
    }

    let mut columns = Vec::with_capacity(first.column_count());
    for name in first.column_names() {
        let mut values = Vec::new();
        for table in tables {
            values.extend_from_slice(table.get(name)?);
        }
        columns.push((name.clone(), values));
    }
    Table::new(columns)
}

impl Table {
    /// Pivot long data to wide.
    ///
    /// Records are grouped by `grouping`. Every distinct value `h` of `headings` (in
    /// ascending order) becomes a column named `prefix` + `h` whose cell, per group, is
    /// the first `values` entry paired with heading `h`, or null if the group has none.
    /// All other columns are dropped.
    pub fn column_squish<S: AsRef<str>>(
        &self,
        grouping: &[S],
        headings: &str,
        values: &str,
        prefix: &str,
    ) -> TableResult<Self> {
        let distinct: BTreeSet<&Value> = self.get(headings)?.iter().collect();
        self.get(values)?;

        let grouping: Vec<&str> = grouping.iter().map(AsRef::as_ref).collect();
        let grouped = self.group_by(&grouping, Some(&[headings, values][..]), None)?;
        let group_headings = grouped.get(headings)?;
        let group_values = grouped.get(values)?;

        let mut columns: Vec<(String, Vec<Value>)> = Vec::new();
        for name in &grouping {
            columns.push((name.to_string(), grouped.get(name)?.to_vec()));
        }
        for heading in distinct {
            let cells = group_headings
                .iter()
                .zip(group_values)
                .map(|(hs, vs)| {
                    let hs = hs.as_list().unwrap_or_default();
                    let vs = vs.as_list().unwrap_or_default();
                    hs.iter()
                        .zip(vs)
                        .find(|(h, _)| *h == heading)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                })
                .collect();
            columns.push((format!("{prefix}{heading}"), cells));
        }
        Self::new(columns)
    }

    /// Unpivot wide data to long.
    ///
    /// For each column in `headings`, emit one record per input record holding the
    /// `grouping` columns, the heading's name in `heading_name` and its value in
    /// `value_name`. Blocks are stacked in `headings` order.
    pub fn headings_squish<S: AsRef<str>>(
        &self,
        grouping: &[S],
        headings: &[S],
        value_name: &str,
        heading_name: &str,
    ) -> TableResult<Self> {
        let mut blocks = Vec::with_capacity(headings.len());
        for heading in headings {
            let heading = heading.as_ref();
            let mut columns = Vec::with_capacity(grouping.len() + 2);
            for name in grouping {
                columns.push((name.as_ref().to_string(), self.get(name.as_ref())?.to_vec()));
            }
            columns.push((
                heading_name.to_string(),
                vec![Value::from(heading); self.record_count()],
            ));
            columns.push((value_name.to_string(), self.get(heading)?.to_vec()));
            blocks.push(Self::new(columns)?);
        }
        stack(&blocks)
    }

    /// Explode a column of maps into one column per distinct key.
    ///
    /// Keys are collected in first-seen order across all cells; cells lacking a key, and
    /// null cells, become null. With `drop` the source column is removed. A new column
    /// may not reuse the name of a remaining one.
    pub fn record_stretch(&self, name: &str, drop: bool) -> TableResult<Self> {
        self.stretch(name, drop).map(|(table, _)| table)
    }

    fn stretch(&self, name: &str, drop: bool) -> TableResult<(Self, Vec<String>)> {
        let cells = self.get(name)?;
        let mut keys: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for cell in cells {
            match cell {
                Value::Map(map) => {
                    for key in map.keys() {
                        if seen.insert(key.as_str()) {
                            keys.push(key.clone());
                        }
                    }
                }
                Value::Null => {}
                other => {
                    return Err(TableError::TypeMismatch {
                        column: name.to_string(),
                        expected: "map",
                        found: other.kind(),
                    })
                }
            }
        }

        let new_columns = keys.iter().map(|key| {
            let values = cells
                .iter()
                .map(|cell| {
                    cell.as_map()
                        .and_then(|map| map.get(key))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();
            (key.clone(), values)
        });
        let base = if drop { self.drop(&[name]) } else { self.clone() };
        let table = Self::new(base.into_columns().into_iter().chain(new_columns))?;
        Ok((table, keys))
    }

    /// Explode a column of lists into one record per list element.
    ///
    /// Every other column is repeated once per element of its record's list; records
    /// with an empty list disappear. The elements replace the source column (appended
    /// last, under `options.new_name` if given), followed by the optional length and
    /// enumeration columns.
    pub fn column_stack(&self, name: &str, options: &ColumnStackOptions) -> TableResult<Self> {
        let cells = self.get(name)?;
        let mut indices = Vec::new();
        let mut elements = Vec::new();
        let mut lengths = Vec::new();
        let mut positions = Vec::new();
        for (row, cell) in cells.iter().enumerate() {
            let Value::List(items) = cell else {
                return Err(TableError::TypeMismatch {
                    column: name.to_string(),
                    expected: "list",
                    found: cell.kind(),
                });
            };
            for (pos, item) in items.iter().enumerate() {
                indices.push(row);
                elements.push(item.clone());
                lengths.push(Value::from(items.len()));
                positions.push(Value::from(pos));
            }
        }

        let existing = self.drop(&[name]).take(&indices);
        let mut extra = vec![(
            options.new_name.clone().unwrap_or_else(|| name.to_string()),
            elements,
        )];
        if let Some(save_len) = &options.save_len {
            extra.push((save_len.clone(), lengths));
        }
        if let Some(enumeration) = &options.enumeration {
            extra.push((enumeration.clone(), positions));
        }
        Self::new(existing.into_columns().into_iter().chain(extra))
    }

    /// Repeatedly explode `name` and every column it produces until no nested cells
    /// remain.
    ///
    /// Map columns are stretched into their keys (each new key column is then visited in
    /// turn) and list columns are stacked and revisited. Fails if a visited column mixes
    /// nested and scalar cells.
    pub fn flatten(&self, name: &str) -> TableResult<Self> {
        let mut frontier = vec![name.to_string()];
        let mut out = self.clone();
        while let Some(column) = frontier.pop() {
            let shape = cell_shape(&column, out.get(&column)?)?;
            match shape {
                CellShape::Map => {
                    let (stretched, keys) = out.stretch(&column, true)?;
                    log::debug!("flatten: {column} stretched into {} columns", keys.len());
                    out = stretched;
                    frontier.extend(keys);
                }
                CellShape::List => {
                    out = out.column_stack(&column, &ColumnStackOptions::default())?;
                    log::debug!("flatten: {column} stacked into {} records", out.record_count());
                    frontier.push(column);
                }
                CellShape::Scalar => {}
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn numbers(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn long() -> Table {
        Table::new(vec![
            ("id", numbers(&[1, 1, 2])),
            ("metric", texts(&["b", "a", "a"])),
            ("value", numbers(&[10, 20, 30])),
        ])
        .unwrap()
    }

    #[test]
    fn column_squish_pivots_headings() {
        let wide = long().column_squish(&["id"], "metric", "value", "m_").unwrap();
        let expected = Table::new(vec![
            ("id", numbers(&[1, 2])),
            ("m_a", numbers(&[20, 30])),
            ("m_b", vec![Value::from(10), Value::Null]),
        ])
        .unwrap();
        assert_eq!(wide, expected);
    }

    #[test]
    fn headings_squish_melts_columns() {
        let wide = long().column_squish(&["id"], "metric", "value", "").unwrap();
        let back = wide
            .headings_squish(&["id"], &["a", "b"], "value", "metric")
            .unwrap();
        assert_eq!(back.column_names(), ["id", "metric", "value"]);
        assert_eq!(back.get("id").unwrap(), numbers(&[1, 2, 1, 2]));
        assert_eq!(back.get("metric").unwrap(), texts(&["a", "a", "b", "b"]));
        assert_eq!(
            back.get("value").unwrap(),
            [Value::from(20), Value::from(30), Value::from(10), Value::Null]
        );
    }

    #[test]
    fn stack_requires_matching_columns() {
        let a = Table::new(vec![("x", numbers(&[1])), ("y", numbers(&[2]))]).unwrap();
        let b = Table::new(vec![("y", numbers(&[4])), ("x", numbers(&[3]))]).unwrap();
        let out = stack(&[a.clone(), b]).unwrap();
        assert_eq!(out.get("x").unwrap(), numbers(&[1, 3]));
        let c = Table::new(vec![("x", numbers(&[1]))]).unwrap();
        assert!(matches!(
            stack(&[a, c]),
            Err(TableError::ColumnSetMismatch { .. })
        ));
        assert!(stack(&[]).is_err());
    }

    #[test]
    fn record_stretch_unions_keys() {
        let table = Table::new(vec![
            ("id", numbers(&[1, 2, 3])),
            (
                "attrs",
                vec![
                    map(&[("a", Value::from(1))]),
                    map(&[("b", Value::from(2))]),
                    Value::Null,
                ],
            ),
        ])
        .unwrap();
        let out = table.record_stretch("attrs", true).unwrap();
        assert_eq!(out.column_names(), ["id", "a", "b"]);
        assert_eq!(out.get("a").unwrap(), [Value::from(1), Value::Null, Value::Null]);

        let kept = table.record_stretch("attrs", false).unwrap();
        assert_eq!(kept.column_names(), ["id", "attrs", "a", "b"]);

        let bad = Table::new(vec![("attrs", numbers(&[1]))]).unwrap();
        assert_eq!(
            bad.record_stretch("attrs", true).unwrap_err(),
            TableError::TypeMismatch {
                column: "attrs".to_string(),
                expected: "map",
                found: "number",
            }
        );
    }

    #[test]
    fn column_stack_repeats_other_columns() {
        let table = Table::new(vec![
            ("id", numbers(&[1, 2, 3])),
            (
                "tags",
                vec![
                    Value::List(texts(&["x", "y"])),
                    Value::List(vec![]),
                    Value::List(texts(&["z"])),
                ],
            ),
        ])
        .unwrap();
        let options = ColumnStackOptions {
            new_name: Some("tag".to_string()),
            save_len: Some("n".to_string()),
            enumeration: Some("i".to_string()),
        };
        let out = table.column_stack("tags", &options).unwrap();
        let expected = Table::new(vec![
            ("id", numbers(&[1, 1, 3])),
            ("tag", texts(&["x", "y", "z"])),
            ("n", numbers(&[2, 2, 1])),
            ("i", numbers(&[0, 1, 0])),
        ])
        .unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn flatten_explodes_nested_json() {
        let doc = serde_json::json!([
            {"user": "ann", "orders": [{"sku": "a1", "qty": 2}, {"sku": "b7", "qty": 1}]},
            {"user": "bob", "orders": [{"sku": "c3", "qty": 5}]}
        ]);
        let table = Table::new(vec![("doc", Value::from(doc).as_list().unwrap().to_vec())]).unwrap();
        let out = table.flatten("doc").unwrap();
        assert_eq!(out.record_count(), 3);
        assert_eq!(out.get("user").unwrap(), texts(&["ann", "ann", "bob"]));
        assert_eq!(out.get("sku").unwrap(), texts(&["a1", "b7", "c3"]));
        assert_eq!(out.get("qty").unwrap(), numbers(&[2, 1, 5]));
        assert!(!out.contains("orders"));
    }

    #[test]
    fn flatten_rejects_mixed_cells() {
        let table = Table::new(vec![(
            "c",
            vec![Value::List(vec![]), Value::from(1)],
        )])
        .unwrap();
        assert!(matches!(
            table.flatten("c"),
            Err(TableError::TypeMismatch { .. })
        ));
    }
}
