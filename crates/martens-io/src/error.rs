use martens::TableError;
use thiserror::Error;

pub type IoResult<T> = Result<T, IoError>;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("csv input was empty")]
    EmptyInput,
    #[error("invalid cell range {0:?}; expected something like \"B2:D10\"")]
    InvalidRange(String),
    #[error("unsupported source format {0:?}")]
    UnsupportedFormat(String),
    #[error("csv parse error at record {record}: {reason}")]
    Parse { record: u64, reason: String },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for IoError {
    fn from(err: csv::Error) -> Self {
        let reason = err.to_string();
        let record = err.position().map_or(0, |p| p.record());
        match err.into_kind() {
            csv::ErrorKind::Io(e) => IoError::Io(e),
            _ => IoError::Parse { record, reason },
        }
    }
}
