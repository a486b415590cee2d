use log::error;
use snafu::Snafu;

pub use crate::errors::Error::*;
use crate::errors::TransportError::IoException;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Transport error: {source}.
    TransportError { source: TransportError },
    /// Parse error: {info}.
    ParseError { info: String },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        error!("std::io error {:?}", error);
        let info = match error.kind() {
            std::io::ErrorKind::NotFound => String::from("Port not found or already in use"),
            std::io::ErrorKind::PermissionDenied => String::from("Port connection lost"),
            _ => error.to_string(),
        };
        Self::TransportError {
            source: IoException { info },
        }
    }
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        Self::TransportError { source: value }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::ParseError {
            info: value.to_string(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    /// {info}
    IoException { info: String },
    /// Connection has not been initialized
    NotInitialized,
}
