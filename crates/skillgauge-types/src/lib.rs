//! Skillgauge Types - Core types for the skillgauge assessment engine
//!
//! This crate defines the data model shared by the engine, the cache and the
//! CLI: skill documents, quality scores, security findings and rankings.
//! All types here are plain values with no I/O; derived labels (verdict,
//! risk level, tier) are pure functions of their numeric inputs.

pub mod document;
pub mod ranking;
pub mod relevance;
pub mod score;
pub mod security;

pub use document::{SkillDocument, SkillType};
pub use ranking::{composite_score, RankedSkill, Tier};
pub use relevance::{RelevanceScore, TechProfile};
pub use score::{DimensionScore, ScoreResult, Verdict};
pub use security::{
    FindingCategory, FindingSource, Recommendation, RiskLevel, ScanResult, SecurityFinding,
    Severity,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        RankedSkill, RelevanceScore, ScanResult, ScoreResult, SkillDocument, SkillType,
        TechProfile, Tier, Verdict,
    };
}
