//! Recommendation ranker
//!
//! Pure synchronous ranking over (quality, relevance) pairs: composite
//! blend, tier bucketing, and a total deterministic order. The ranker
//! accepts pre-computed quality results (typically loaded from the cache)
//! and never re-invokes the scorer; [`recommend`] is the full pipeline that
//! filters candidates, issues the one batched relevance call, and ranks.

use skillgauge_provider::AnalysisService;
use skillgauge_types::{RankedSkill, RelevanceScore, ScoreResult, TechProfile, Verdict};
use tracing::info;

use crate::error::Result;
use crate::relevance::RelevanceMatcher;

/// Candidates below this weighted quality score are excluded from
/// recommendation before the relevance call.
pub const DEFAULT_MIN_QUALITY: f64 = 50.0;

/// One recommendation candidate: the slice of a quality evaluation the
/// matcher and ranker need.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Stable identity key, used for batch correlation.
    pub key: String,
    /// Display title; falls back to the key.
    pub title: String,
    /// Weighted quality score from the dimension scorer.
    pub quality: f64,
    pub verdict: Verdict,
    /// Content summary shown to the matcher.
    pub summary: String,
}

impl Candidate {
    /// Build a candidate from a (possibly cached) quality evaluation.
    pub fn from_score(result: &ScoreResult, title: Option<&str>) -> Self {
        Self {
            key: result.doc_key.clone(),
            title: title.unwrap_or(&result.doc_key).to_string(),
            quality: result.weighted_score,
            verdict: result.verdict,
            summary: result.summary.clone(),
        }
    }
}

/// Rank candidates against their relevance scores.
///
/// Sorting is total and reproducible: descending composite, ties broken by
/// descending relevance, then ascending title. Tier grouping follows from
/// the composite order since the tier is a pure function of the composite.
pub fn rank(entries: Vec<(Candidate, RelevanceScore)>) -> Vec<RankedSkill> {
    let mut ranked: Vec<RankedSkill> = entries
        .into_iter()
        .map(|(candidate, relevance)| {
            RankedSkill::new(
                candidate.key,
                candidate.title,
                candidate.quality,
                candidate.verdict,
                &relevance,
            )
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.composite
            .total_cmp(&a.composite)
            .then_with(|| b.relevance.cmp(&a.relevance))
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked
}

/// Full recommendation pipeline over pre-computed quality results.
///
/// Filters out candidates below `min_quality`, issues the single batched
/// relevance request, and returns the ranked list.
///
/// # Errors
///
/// Propagates [`crate::EngineError::ProfileMissing`] and
/// [`crate::EngineError::MatchingUnavailable`] from the matcher.
pub async fn recommend<S: AnalysisService>(
    service: &S,
    profile: &TechProfile,
    candidates: Vec<Candidate>,
    min_quality: f64,
) -> Result<Vec<RankedSkill>> {
    let total = candidates.len();
    let eligible: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.quality >= min_quality)
        .collect();
    if eligible.len() < total {
        info!(
            excluded = total - eligible.len(),
            floor = min_quality,
            "candidates below the quality floor excluded from matching"
        );
    }

    let matcher = RelevanceMatcher::new(service);
    let mut scores = matcher.match_profile(profile, &eligible).await?;

    let entries = eligible
        .into_iter()
        .map(|candidate| {
            let relevance = scores
                .remove(&candidate.key)
                .unwrap_or_else(RelevanceScore::unscored);
            (candidate, relevance)
        })
        .collect();

    Ok(rank(entries))
}
