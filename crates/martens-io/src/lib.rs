//! File adapters for [`martens`] tables: CSV sources and sinks, header cleanup,
//! spreadsheet-style ranges and a plain-text grid renderer.

#![forbid(unsafe_code)]

mod error;
mod range;
mod render;
mod sink;
mod source;

pub use crate::error::{IoError, IoResult};
pub use crate::range::{column_number, parse_range, CellRange};
pub use crate::render::render;
pub use crate::sink::{write_csv, write_csv_path};
pub use crate::source::{read_csv, sanitise_column_name, SourceFile, SourceOptions};
