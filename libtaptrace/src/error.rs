use thiserror::Error;

use crate::tap::TapState;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// A capture row that cannot be interpreted. Decoding stops here, since
    /// every following sample would be framed against the wrong bit/byte boundary.
    #[error("malformed capture row {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("no transition from {state} with tms={tms}")]
    Invariant { state: TapState, tms: bool },

    #[error("capture i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("capture csv failed: {0}")]
    Csv(#[from] csv::Error),
}

impl DecodeError {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        DecodeError::Format {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DecodeError> = core::result::Result<T, E>;
