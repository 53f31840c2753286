use serde::{Deserialize, Serialize};

use crate::relevance::RelevanceScore;
use crate::score::Verdict;

/// Quality share of the composite score; relevance takes the remainder.
const QUALITY_WEIGHT: f64 = 0.6;

/// Blend quality and relevance into one composite score, one decimal.
pub fn composite_score(quality: f64, relevance: u8) -> f64 {
    let raw = quality * QUALITY_WEIGHT + f64::from(relevance) * (1.0 - QUALITY_WEIGHT);
    (raw * 10.0).round() / 10.0
}

/// Presentation tier, derived from the composite score alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    MustInstall,
    Install,
    Maybe,
    Skip,
}

impl Tier {
    /// must_install >= 85, install [70, 85), maybe [50, 70), skip < 50.
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 85.0 {
            Self::MustInstall
        } else if composite >= 70.0 {
            Self::Install
        } else if composite >= 50.0 {
            Self::Maybe
        } else {
            Self::Skip
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MustInstall => "must install",
            Self::Install => "install",
            Self::Maybe => "maybe",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One ranked recommendation entry.
///
/// Recomputed whenever either input changes; never cached independently of
/// the quality and relevance results it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSkill {
    pub key: String,
    pub title: String,
    /// Weighted quality score from the dimension scorer.
    pub quality: f64,
    pub verdict: Verdict,
    /// Relevance against the caller's profile, 0-100.
    pub relevance: u8,
    pub reason: String,
    pub composite: f64,
    pub tier: Tier,
}

impl RankedSkill {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        quality: f64,
        verdict: Verdict,
        relevance: &RelevanceScore,
    ) -> Self {
        let composite = composite_score(quality, relevance.score);
        Self {
            key: key.into(),
            title: title.into(),
            quality,
            verdict,
            relevance: relevance.score,
            reason: relevance.reason.clone(),
            composite,
            tier: Tier::from_composite(composite),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_blend_is_sixty_forty() {
        assert_eq!(composite_score(80.0, 90), 84.0);
        assert_eq!(composite_score(100.0, 0), 60.0);
        assert_eq!(composite_score(0.0, 100), 40.0);
    }

    #[test]
    fn tier_thresholds_inclusive_lower_bound() {
        assert_eq!(Tier::from_composite(85.0), Tier::MustInstall);
        assert_eq!(Tier::from_composite(84.9), Tier::Install);
        assert_eq!(Tier::from_composite(70.0), Tier::Install);
        assert_eq!(Tier::from_composite(69.9), Tier::Maybe);
        assert_eq!(Tier::from_composite(50.0), Tier::Maybe);
        assert_eq!(Tier::from_composite(49.9), Tier::Skip);
    }

    #[test]
    fn ranked_skill_derives_composite_and_tier() {
        let entry = RankedSkill::new(
            "db-migrations",
            "Database Migration Safety",
            90.0,
            Verdict::Install,
            &RelevanceScore::new(80, "matches the declared stack"),
        );
        assert_eq!(entry.composite, 86.0);
        assert_eq!(entry.tier, Tier::MustInstall);
    }
}
