use thiserror::Error;

/// Status codes reported by engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Success,
    InvalidArgument,
    FunctionNotImplemented,
    NoSuchFileOrDirectory,
    SyntaxError,
    ObjectCorrupt,
    ResourceBusy,
    InvalidFormat,
}

impl ReturnCode {
    pub fn is_success(&self) -> bool { matches!(self, ReturnCode::Success) }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReturnCode::Success => "success",
            ReturnCode::InvalidArgument => "invalid argument",
            ReturnCode::FunctionNotImplemented => "function not implemented",
            ReturnCode::NoSuchFileOrDirectory => "no such file or directory",
            ReturnCode::SyntaxError => "syntax error",
            ReturnCode::ObjectCorrupt => "object corrupt",
            ReturnCode::ResourceBusy => "resource busy",
            ReturnCode::InvalidFormat => "invalid format",
        };
        f.write_str(name)
    }
}

/// A failed engine call: the return code plus the message the engine left in its buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({rc})")]
pub struct EngineError {
    pub rc: ReturnCode,
    pub message: String,
}

impl EngineError {
    pub fn new(rc: ReturnCode, message: impl Into<String>) -> Self { Self { rc, message: message.into() } }

    pub fn invalid_argument(message: impl Into<String>) -> Self { Self::new(ReturnCode::InvalidArgument, message) }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(ReturnCode::NoSuchFileOrDirectory, message) }
}

pub type Result<T> = std::result::Result<T, EngineError>;
