use std::io;
use std::path::PathBuf;

/// Errors returned by the matrix engine, the regression solver and the classifier.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    Index {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix is singular (zero pivot in column {column})")]
    SingularMatrix { column: usize },

    #[error("regression failed: {reason}")]
    RegressionFailed {
        reason: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no data: {0}")]
    NoData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn regression(reason: impl Into<String>) -> Self {
        Error::RegressionFailed {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn regression_from(reason: impl Into<String>, source: Error) -> Self {
        Error::RegressionFailed {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
