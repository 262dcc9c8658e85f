use lexscan_engine::{EngineError, ReturnCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("engine failure: {0}")]
    Engine(EngineError),
    #[error("conversion failed: {0}")]
    Conversion(String),
    #[error("recheck failed: {0}")]
    Recheck(#[from] lexql::selection::filter::Error),
}

impl From<EngineError> for ScanError {
    fn from(err: EngineError) -> Self {
        match err.rc {
            ReturnCode::InvalidArgument => ScanError::InvalidArgument(err.message),
            ReturnCode::FunctionNotImplemented => ScanError::Unsupported(err.message),
            ReturnCode::NoSuchFileOrDirectory => ScanError::NotFound(err.message),
            _ => ScanError::Engine(err),
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

/// How a failed lookup is reported: `Silent` yields `None`, `Error` yields `ScanError::NotFound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Silent,
    Error,
}

impl ErrorLevel {
    pub(crate) fn miss<T>(&self, message: impl FnOnce() -> String) -> ScanResult<Option<T>> {
        match self {
            ErrorLevel::Silent => Ok(None),
            ErrorLevel::Error => Err(ScanError::NotFound(message())),
        }
    }
}
