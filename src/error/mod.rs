//! Error handling module for vidsqueeze

use thiserror::Error;

/// Main error type for vidsqueeze operations
#[derive(Error, Debug)]
pub enum SqueezeError {
    /// The transcoding engine could not be initialized. The engine stays in
    /// `Failed` for the rest of the process; there is no automatic retry.
    #[error("Failed to initialize transcoding engine: {message}")]
    EngineLoad { message: String },

    /// The engine rejected the command or the run itself failed. All virtual
    /// files staged for the session are removed before this propagates.
    #[error("Encoding failed: {message}")]
    Encode { message: String },

    /// A compression strategy was selected but its input could not be
    /// interpreted. Missing numeric fields default instead of raising this;
    /// it is reserved for genuinely unparseable input.
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqueezeError {
    pub fn engine_load(message: impl Into<String>) -> Self {
        SqueezeError::EngineLoad {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        SqueezeError::Encode {
            message: message.into(),
        }
    }

    pub fn invalid_settings(message: impl Into<String>) -> Self {
        SqueezeError::InvalidSettings {
            message: message.into(),
        }
    }
}

/// Result type alias for vidsqueeze operations
pub type SqueezeResult<T> = std::result::Result<T, SqueezeError>;
