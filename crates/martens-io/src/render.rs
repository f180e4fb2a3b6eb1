use martens::Table;
use std::fmt::Write;

/// Render `table` as a plain-text grid, one line per record after a header line.
///
/// Each column is padded to one more than its widest cell or heading.
pub fn render(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .column_names()
        .iter()
        .map(|name| {
            table
                .get(name)
                .map(|values| values.iter().map(ToString::to_string).collect())
                .unwrap_or_default()
        })
        .collect();
    let widths: Vec<usize> = table
        .column_names()
        .iter()
        .zip(&cells)
        .map(|(name, column)| {
            column
                .iter()
                .map(|cell| cell.chars().count())
                .chain([name.chars().count()])
                .max()
                .unwrap_or(0)
                + 1
        })
        .collect();

    let mut out = String::new();
    out.push('|');
    for (name, &width) in table.column_names().iter().zip(&widths) {
        let _ = write!(out, "{name:<width$}|");
    }
    out.push('\n');
    for row in 0..table.record_count() {
        out.push('|');
        for (column, &width) in cells.iter().zip(&widths) {
            let _ = write!(out, "{:<width$}|", column[row]);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use martens::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn pads_columns_to_widest_cell() {
        let table = Table::new(vec![
            ("id", vec![Value::from(1), Value::from(10)]),
            ("name", vec![Value::from("bob"), Value::Null]),
            ("tags", vec![Value::List(vec![Value::from("x")]), Value::List(vec![])]),
        ])
        .unwrap();
        assert_eq!(
            render(&table),
            "|id |name |tags |\n|1  |bob  |[x]  |\n|10 |     |[]   |\n"
        );
    }
}
