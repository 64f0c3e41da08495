use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("RPC transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC endpoint answered with HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("RPC protocol error: {message}")]
    Protocol { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，用於日誌上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Protocol,
    Io,
}

impl ImportError {
    pub fn protocol(message: impl Into<String>) -> Self {
        ImportError::Protocol {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::Transport(_) | ImportError::HttpStatus { .. } => ErrorCategory::Transport,
            ImportError::Fault { .. }
            | ImportError::Protocol { .. }
            | ImportError::SerializationError(_) => ErrorCategory::Protocol,
            ImportError::IoError(_) => ErrorCategory::Io,
            ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
