use crate::error::IoResult;
use martens::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `table` as CSV with a header row. Nulls are written as empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> IoResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.column_names())?;
    let mut fields = Vec::with_capacity(table.column_count());
    for record in table.records() {
        fields.clear();
        fields.extend(record.iter().map(|(_, value)| value.to_string()));
        csv_writer.write_record(&fields)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_path(table: &Table, path: impl AsRef<Path>) -> IoResult<()> {
    let path = path.as_ref();
    log::debug!(
        "writing {} records to {}",
        table.record_count(),
        path.display()
    );
    write_csv(table, BufWriter::new(File::create(path)?))
}
