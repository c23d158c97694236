use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown entity: {name}")]
    UnknownEntity { name: String },

    #[error("duplicate entity: {name}")]
    DuplicateEntity { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("failed to initialize logging: {message}")]
    Logging { message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::UnknownEntity { .. }
            | Self::DuplicateEntity { .. }
            | Self::InvalidArgument { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
