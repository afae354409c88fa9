//! Error handling for the Sentinel Vision engine.
//!
//! The engine itself is fallback-driven: unknown classes and uncovered points
//! resolve to defaults instead of failing. The only runtime failure is malformed
//! input from the detector/tracker, which the frame-acquisition loop must decide
//! to skip or abort on.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame or one of its detections cannot be enriched.
    #[error("InvalidDetectionInput at frame {frame_index}: {reason}")]
    InvalidDetectionInput { frame_index: u64, reason: String },

    /// Session configuration rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The parallel worker pool dropped a task or its reply.
    #[error("Worker pool error: {0}")]
    WorkerPool(&'static str),
}

impl Error {
    pub(crate) fn invalid_input(frame_index: u64, reason: impl Into<String>) -> Self {
        Error::InvalidDetectionInput {
            frame_index,
            reason: reason.into(),
        }
    }
}
