use thiserror::Error;

use crate::stream::Location;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SjsonError {
    #[error("{msg} at line {line}, column {column}")]
    Parse {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unsupported value: {0}")]
    Unsupported(String),
}

impl SjsonError {
    pub fn at(msg: impl Into<String>, location: Location) -> Self {
        SjsonError::Parse {
            msg:    msg.into(),
            line:   location.line,
            column: location.column,
        }
    }

    /// Where the error occurred, for errors that come from parsing.
    pub fn location(&self) -> Option<Location> {
        match *self {
            SjsonError::Parse { line, column, .. } => Some(Location { line, column }),
            SjsonError::Unsupported(_) => None,
        }
    }
}
