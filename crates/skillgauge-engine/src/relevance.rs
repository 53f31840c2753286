//! Relevance matcher
//!
//! One batched request covers every candidate document at once, and the
//! reply is re-associated by document identity, never by list position:
//! the service is not guaranteed to preserve or correctly number the order
//! of a batch. Candidates absent from the reply get the "unscored" zero,
//! which is a real answer, not a failure.

use std::collections::BTreeMap;

use serde::Deserialize;
use skillgauge_provider::{AnalysisService, TaskKind};
use skillgauge_types::{RelevanceScore, TechProfile};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::parse::{parse_reply, REPAIR_REMINDER};
use crate::ranker::Candidate;

const MATCH_SCHEMA: &str = r#"{
  "matches": [
    {
      "name": "<document name, exactly as listed above>",
      "relevance": <0-100 integer>,
      "reason": "<one sentence on why it is or is not relevant>"
    }
  ]
}"#;

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    name: String,
    #[serde(default)]
    relevance: f64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct RawMatches {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

/// Relevance matcher over an [`AnalysisService`].
pub struct RelevanceMatcher<'a, S: AnalysisService> {
    service: &'a S,
}

impl<'a, S: AnalysisService> RelevanceMatcher<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Score every candidate's relevance against the profile.
    ///
    /// Issues a single batched request for the whole candidate set. The
    /// returned map has an entry for every candidate key; candidates the
    /// reply did not cover carry [`RelevanceScore::unscored`].
    ///
    /// # Errors
    ///
    /// [`EngineError::ProfileMissing`] if the profile declares no stack
    /// (fails fast, before any external call);
    /// [`EngineError::MatchingUnavailable`] once the retry budget is spent.
    pub async fn match_profile(
        &self,
        profile: &TechProfile,
        candidates: &[Candidate],
    ) -> Result<BTreeMap<String, RelevanceScore>> {
        if profile.is_empty() {
            return Err(EngineError::ProfileMissing);
        }
        if candidates.is_empty() {
            return Ok(BTreeMap::new());
        }

        let prompt = build_match_prompt(profile, candidates);

        let raw = self
            .service
            .complete(TaskKind::RelevanceMatching, &prompt)
            .await
            .map_err(|e| EngineError::MatchingUnavailable {
                reason: e.to_string(),
            })?;

        let matches = match parse_reply::<RawMatches>("relevance-matching", &raw) {
            Ok(parsed) => parsed,
            Err(first_err) => {
                debug!("relevance reply malformed, re-prompting once");
                let repair_prompt = format!("{prompt}{REPAIR_REMINDER}");
                let raw = self
                    .service
                    .complete(TaskKind::RelevanceMatching, &repair_prompt)
                    .await
                    .map_err(|e| EngineError::MatchingUnavailable {
                        reason: e.to_string(),
                    })?;
                parse_reply::<RawMatches>("relevance-matching", &raw).map_err(|_| first_err)?
            }
        };

        Ok(correlate(candidates, matches.matches))
    }
}

/// Re-associate reply entries with candidates by identity key or title.
///
/// Matching is case-insensitive on the trimmed name. Reply entries that name
/// no known candidate are logged and dropped; duplicate entries for one
/// candidate keep the first.
fn correlate(
    candidates: &[Candidate],
    matches: Vec<RawMatch>,
) -> BTreeMap<String, RelevanceScore> {
    let mut by_identity: BTreeMap<String, &Candidate> = BTreeMap::new();
    for candidate in candidates {
        by_identity.insert(candidate.key.to_lowercase(), candidate);
        by_identity.insert(candidate.title.trim().to_lowercase(), candidate);
    }

    let mut scored: BTreeMap<String, RelevanceScore> = BTreeMap::new();
    for entry in matches {
        let name = entry.name.trim().to_lowercase();
        let Some(candidate) = by_identity.get(&name) else {
            warn!(name = %entry.name, "relevance reply names unknown document, dropping");
            continue;
        };
        scored.entry(candidate.key.clone()).or_insert_with(|| {
            RelevanceScore::new(entry.relevance.clamp(0.0, 100.0).round() as u8, entry.reason)
        });
    }

    for candidate in candidates {
        scored
            .entry(candidate.key.clone())
            .or_insert_with(RelevanceScore::unscored);
    }
    scored
}

fn build_match_prompt(profile: &TechProfile, candidates: &[Candidate]) -> String {
    let mut listing = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        listing.push_str(&format!(
            "{}. [{}] quality={:.1}  summary: {:.120}\n",
            i + 1,
            candidate.key,
            candidate.quality,
            candidate.summary
        ));
    }

    let notes = if profile.notes.trim().is_empty() {
        "none"
    } else {
        profile.notes.as_str()
    };

    format!(
        "Score how relevant each candidate skill document is to this project.\n\n\
         ## Project\n\n\
         - Tech stack: {stack}\n\
         - Project type: {project_type}\n\
         - Notes: {notes}\n\n\
         ## Candidates\n\n\
         Each line: number, [name], quality score (0-100), content summary.\n\n\
         {listing}\n\
         ## Relevance scale\n\n\
         - 100 = perfect match, would be used daily\n\
         - 70-99 = highly relevant, strongly recommended\n\
         - 40-69 = somewhat relevant, depends on the situation\n\
         - 1-39 = low relevance, occasionally useful\n\
         - 0 = not relevant to this project at all\n\n\
         ## Output format (output ONLY the JSON, nothing else)\n\n{MATCH_SCHEMA}\n",
        stack = profile.stack,
        project_type = profile.project_type,
    )
}
