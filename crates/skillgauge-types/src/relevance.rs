use serde::{Deserialize, Serialize};

/// Technology/project profile a consumer declares for relevance matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechProfile {
    /// Technology stack, e.g. "Next.js, Python, PostgreSQL".
    pub stack: String,
    /// Project type, e.g. "web app", "API service", "CLI tool".
    pub project_type: String,
    /// Free-form extra notes.
    #[serde(default)]
    pub notes: String,
}

impl TechProfile {
    pub fn new(
        stack: impl Into<String>,
        project_type: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            stack: stack.into(),
            project_type: project_type.into(),
            notes: notes.into(),
        }
    }

    /// A profile with no declared stack cannot be matched against.
    pub fn is_empty(&self) -> bool {
        self.stack.trim().is_empty()
    }
}

/// Relevance of one document against one profile.
///
/// Scoped to a single (profile, document-set) request; a score of 0 with the
/// "unscored" reason is the real answer for documents the service response
/// did not cover, not a failure state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceScore {
    /// 0-100; 0 means not relevant (or unscored, see `reason`).
    pub score: u8,
    pub reason: String,
}

impl RelevanceScore {
    pub fn new(score: u8, reason: impl Into<String>) -> Self {
        Self {
            score: score.min(100),
            reason: reason.into(),
        }
    }

    /// Fallback for a document the batched response did not mention.
    pub fn unscored() -> Self {
        Self {
            score: 0,
            reason: "unscored".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_detected() {
        assert!(TechProfile::default().is_empty());
        assert!(TechProfile::new("  ", "web app", "").is_empty());
        assert!(!TechProfile::new("Rust, tokio", "CLI tool", "").is_empty());
    }

    #[test]
    fn relevance_clamps_to_100() {
        assert_eq!(RelevanceScore::new(250, "x").score, 100);
    }

    #[test]
    fn unscored_is_zero_with_reason() {
        let r = RelevanceScore::unscored();
        assert_eq!(r.score, 0);
        assert_eq!(r.reason, "unscored");
    }
}
