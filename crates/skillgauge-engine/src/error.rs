//! Error types for engine operations

use skillgauge_provider::ProviderError;
use thiserror::Error;

/// Engine errors
///
/// Per-document failures (`ScoringUnavailable`, `ScanUnavailable`,
/// `MalformedResponse`) abort the operation for that document only; a batch
/// reports them per document and continues. `ProfileMissing` and
/// `InvalidRubric` fail fast before any external call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Quality scoring exhausted its retry budget for one document
    #[error("scoring unavailable for '{doc_key}': {reason}")]
    ScoringUnavailable {
        /// Identity key of the affected document
        doc_key: String,
        /// Message of the final provider failure
        reason: String,
    },

    /// Security scan exhausted its retry budget for one document
    #[error("scan unavailable for '{doc_key}': {reason}")]
    ScanUnavailable {
        /// Identity key of the affected document
        doc_key: String,
        /// Message of the final provider failure
        reason: String,
    },

    /// Relevance matching exhausted its retry budget
    #[error("relevance matching unavailable: {reason}")]
    MatchingUnavailable {
        /// Message of the final provider failure
        reason: String,
    },

    /// Skill generation exhausted its retry budget
    #[error("generation unavailable: {reason}")]
    GenerationUnavailable {
        /// Message of the final provider failure
        reason: String,
    },

    /// Service reply still unparseable after the one repair attempt
    #[error("malformed {task} response: {details}")]
    MalformedResponse {
        /// Pipeline stage whose reply failed to parse
        task: String,
        /// Parse failure detail, with a sample of the offending payload
        details: String,
    },

    /// Relevance requested without a technology profile
    #[error("relevance matching requires a technology profile with a non-empty stack")]
    ProfileMissing,

    /// Dimension catalog weights do not sum to 1.0
    #[error("invalid rubric: dimension weights sum to {actual}, expected 1.0")]
    InvalidRubric {
        /// The actual weight sum of the rejected catalog
        actual: f64,
    },
}

impl EngineError {
    /// Wrap a provider failure as a scoring outage for one document.
    pub fn scoring_unavailable(doc_key: impl Into<String>, source: &ProviderError) -> Self {
        Self::ScoringUnavailable {
            doc_key: doc_key.into(),
            reason: source.to_string(),
        }
    }

    /// Wrap a provider failure as a scan outage for one document.
    pub fn scan_unavailable(doc_key: impl Into<String>, source: &ProviderError) -> Self {
        Self::ScanUnavailable {
            doc_key: doc_key.into(),
            reason: source.to_string(),
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
