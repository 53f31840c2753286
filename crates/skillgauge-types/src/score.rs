use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::SkillType;

/// Final quality label, derived from the weighted score alone.
///
/// The external service also emits a verdict label, but it is discarded:
/// the thresholds here are the single source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Install,
    Maybe,
    Skip,
}

impl Verdict {
    /// INSTALL >= 75, MAYBE in [50, 75), SKIP < 50.
    pub fn from_weighted(weighted_score: f64) -> Self {
        if weighted_score >= 75.0 {
            Self::Install
        } else if weighted_score >= 50.0 {
            Self::Maybe
        } else {
            Self::Skip
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Install => "INSTALL",
            Self::Maybe => "MAYBE",
            Self::Skip => "SKIP",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw score and rationale for one evaluation dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Raw score in [0, 100]; out-of-range service values are clamped.
    pub score: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl DimensionScore {
    /// Build from a possibly out-of-range raw value, clamping into [0, 100].
    pub fn clamped(raw: i64) -> Self {
        Self {
            score: raw.clamp(0, 100) as u8,
            ..Self::default()
        }
    }
}

/// Complete quality evaluation of one document.
///
/// `weighted_score` and `verdict` are derived locally from the per-dimension
/// raw scores; they are never taken from the service response. Owned by the
/// evaluation request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub id: Uuid,
    /// Identity key of the evaluated document.
    pub doc_key: String,
    pub skill_type: SkillType,
    /// Per-dimension raw scores, keyed by dimension key. BTreeMap keeps
    /// report output in a stable order.
    pub dimensions: BTreeMap<String, DimensionScore>,
    /// Weighted sum of dimension scores, one decimal.
    pub weighted_score: f64,
    pub verdict: Verdict,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub top_issues: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl ScoreResult {
    pub fn new(
        doc_key: impl Into<String>,
        skill_type: SkillType,
        dimensions: BTreeMap<String, DimensionScore>,
        weighted_score: f64,
        summary: String,
        top_issues: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            doc_key: doc_key.into(),
            skill_type,
            dimensions,
            weighted_score,
            verdict: Verdict::from_weighted(weighted_score),
            summary,
            top_issues,
            evaluated_at: Utc::now(),
        }
    }

    /// Raw score for one dimension, 0 if the dimension is absent.
    pub fn dimension_score(&self, key: &str) -> u8 {
        self.dimensions.get(key).map(|d| d.score).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_thresholds_inclusive_lower_bound() {
        assert_eq!(Verdict::from_weighted(75.0), Verdict::Install);
        assert_eq!(Verdict::from_weighted(74.9), Verdict::Maybe);
        assert_eq!(Verdict::from_weighted(50.0), Verdict::Maybe);
        assert_eq!(Verdict::from_weighted(49.9), Verdict::Skip);
        assert_eq!(Verdict::from_weighted(0.0), Verdict::Skip);
        assert_eq!(Verdict::from_weighted(100.0), Verdict::Install);
    }

    #[test]
    fn verdict_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Install).unwrap(), "\"INSTALL\"");
        let back: Verdict = serde_json::from_str("\"SKIP\"").unwrap();
        assert_eq!(back, Verdict::Skip);
    }

    #[test]
    fn dimension_score_clamps() {
        assert_eq!(DimensionScore::clamped(-5).score, 0);
        assert_eq!(DimensionScore::clamped(0).score, 0);
        assert_eq!(DimensionScore::clamped(87).score, 87);
        assert_eq!(DimensionScore::clamped(250).score, 100);
    }

    #[test]
    fn score_result_derives_verdict_from_weighted() {
        let result = ScoreResult::new(
            "demo",
            SkillType::SelfContained,
            BTreeMap::new(),
            76.8,
            String::new(),
            vec![],
        );
        assert_eq!(result.verdict, Verdict::Install);
    }
}
