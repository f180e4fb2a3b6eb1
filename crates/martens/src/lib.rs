//! In-memory, column-oriented tables.
//!
//! A [`Table`] is an ordered set of named columns of equal length, holding dynamically
//! typed [`Value`]s. Every operation returns a new table and leaves its input untouched.
//!
//! ```
//! use martens::{Func, JoinType, Table, Value};
//!
//! let sales = Table::new(vec![
//!     ("region", vec![Value::from("north"), Value::from("south"), Value::from("north")]),
//!     ("amount", vec![Value::from(10), Value::from(5), Value::from(7)]),
//! ])?;
//! let totals = sales
//!     .group_by(&["region"], None, Some("n"))?
//!     .mutate(&Func::new("total", ["amount"], |args: &[&Value]| {
//!         martens::agg::sum(args[0].as_list().unwrap_or_default())
//!     }))?;
//! assert_eq!(totals.get("total")?, [Value::from(17), Value::from(5)]);
//!
//! let managers = Table::new(vec![
//!     ("region", vec![Value::from("north")]),
//!     ("manager", vec![Value::from("ines")]),
//! ])?;
//! let joined = totals.merge(&managers, &["region"], JoinType::Left)?;
//! assert_eq!(joined.get("manager")?, [Value::from("ines"), Value::Null]);
//! # Ok::<(), martens::TableError>(())
//! ```

#![forbid(unsafe_code)]

pub mod agg;
mod apply;
mod error;
mod group;
mod join;
mod projection;
mod reshape;
mod table;
mod value;

pub use crate::apply::Func;
pub use crate::error::{TableError, TableResult};
pub use crate::join::JoinType;
pub use crate::projection::{Columns, SortOrder};
pub use crate::reshape::{stack, ColumnStackOptions};
pub use crate::table::{Record, Records, Table};
pub use crate::value::Value;
