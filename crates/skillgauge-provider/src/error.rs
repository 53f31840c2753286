//! Error types for analysis service calls

use thiserror::Error;

/// Analysis service client errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Underlying API request failed (transport, auth, bad request)
    #[error("API request failed: {0}")]
    Api(#[from] async_openai::error::OpenAIError),

    /// Service answered but returned no content
    #[error("service returned an empty response")]
    EmptyResponse,

    /// One call exceeded the configured timeout
    #[error("call timed out after {timeout_secs}s")]
    Timeout {
        /// Configured per-call timeout in seconds
        timeout_secs: u64,
    },

    /// All retry attempts exhausted
    #[error("service unreachable after {attempts} attempts: {last_error}")]
    ServiceUnreachable {
        /// Total attempts made, including the first
        attempts: u32,
        /// Message of the final failure
        last_error: String,
    },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, ProviderError>;
