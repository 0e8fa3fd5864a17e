//! Error types for stickgen.
//!
//! Taxonomy:
//! - Config: fatal at startup, before any sampling begins
//! - Tool/Parse: an external collaborator misbehaved; recovered inside the
//!   classification pipeline (a single bad polygon never aborts a run)
//! - Io/Internal: infrastructure failures

use thiserror::Error;

/// Top-level error type for stickgen.
#[derive(Debug, Error)]
pub enum StickgenError {
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StickgenError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an external-tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for stickgen.
pub type Result<T> = std::result::Result<T, StickgenError>;
