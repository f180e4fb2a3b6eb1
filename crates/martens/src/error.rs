pub type TableResult<T> = Result<T, TableError>;

/// Failures reported by table operations.
///
/// Every operation validates its inputs before building a result, so an error means no
/// table was produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("column {column} has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column set {actual:?} does not match {expected:?}")]
    ColumnSetMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("column {column} holds {found} values, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("function returned {actual} values, expected {expected}")]
    ResultLength { expected: usize, actual: usize },

    #[error("unknown join type: {0} (expected inner, left, right or full)")]
    UnknownJoinType(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
