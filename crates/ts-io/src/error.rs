//! I/O-layer error type.

use thiserror::Error;

use ts_net::NetError;

/// Errors that can occur while reading inputs or writing outputs.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("network error: {0}")]
    Net(#[from] NetError),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("missing property {0:?}")]
    MissingKey(String),
}

/// Shorthand result type for `ts-io`.
pub type IoResult<T> = Result<T, IoError>;
