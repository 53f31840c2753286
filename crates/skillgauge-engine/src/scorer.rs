//! Dimension scorer
//!
//! Sends one quality-scoring request per document, validates and repairs the
//! reply, and computes the weighted score and verdict locally. The service
//! reply carries its own verdict label; it is parsed and discarded. The
//! service may rationalize a verdict inconsistent with its own numbers, and
//! the fixed thresholds in [`skillgauge_types::Verdict`] are the single
//! source of truth.

use std::collections::BTreeMap;

use serde::Deserialize;
use skillgauge_provider::{AnalysisService, TaskKind};
use skillgauge_types::{DimensionScore, ScoreResult, SkillDocument, SkillType};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::parse::{parse_reply, REPAIR_REMINDER};
use crate::rubric::Rubric;

/// JSON shape requested from the service, shared by both rubric variants.
const OUTPUT_SCHEMA: &str = r#"{
  "scores": {
    "trigger_clarity":       { "score": <0-100 integer>, "strengths": [], "weaknesses": [], "suggestions": [] },
    "structure_completeness": { "score": <0-100 integer>, "strengths": [], "weaknesses": [], "suggestions": [] },
    "step_executability":    { "score": <0-100 integer>, "strengths": [], "weaknesses": [], "suggestions": [] },
    "example_quality":       { "score": <0-100 integer>, "strengths": [], "weaknesses": [], "suggestions": [] },
    "scope_appropriateness": { "score": <0-100 integer>, "strengths": [], "weaknesses": [], "suggestions": [] }
  },
  "overall_summary": "<2-3 sentence overall assessment>",
  "top_issues": ["<issue 1>", "<issue 2>"],
  "verdict": "INSTALL" | "MAYBE" | "SKIP"
}"#;

/// Raw per-dimension entry as the service reports it.
///
/// `score` is a float on purpose: the service occasionally emits `87.0` or
/// an out-of-range value, and both clamp rather than fail.
#[derive(Debug, Deserialize)]
struct RawDimension {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Full reply shape. The service's `verdict` is deserialized only so a
/// disagreement with the local computation can be logged.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    scores: BTreeMap<String, RawDimension>,
    #[serde(default)]
    overall_summary: String,
    #[serde(default)]
    top_issues: Vec<String>,
    #[serde(default)]
    verdict: Option<String>,
}

/// Quality scorer over an [`AnalysisService`].
pub struct DimensionScorer<'a, S: AnalysisService> {
    service: &'a S,
    rubric: Rubric,
}

impl<'a, S: AnalysisService> DimensionScorer<'a, S> {
    pub fn new(service: &'a S) -> Result<Self> {
        Ok(Self {
            service,
            rubric: Rubric::standard()?,
        })
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Score one document under the rubric variant for its type.
    ///
    /// # Errors
    ///
    /// [`EngineError::ScoringUnavailable`] once the service retry budget is
    /// spent, [`EngineError::MalformedResponse`] if the reply still fails to
    /// parse after the one stricter re-prompt.
    pub async fn score(&self, document: &SkillDocument) -> Result<ScoreResult> {
        let prompt = self.build_prompt(document);

        let raw = self
            .service
            .complete(TaskKind::QualityScoring, &prompt)
            .await
            .map_err(|e| EngineError::scoring_unavailable(&document.key, &e))?;

        let evaluation = match parse_reply::<RawEvaluation>("quality-scoring", &raw) {
            Ok(evaluation) => evaluation,
            Err(first_err) => {
                debug!(doc = %document.key, "scoring reply malformed, re-prompting once");
                let repair_prompt = format!("{prompt}{REPAIR_REMINDER}");
                let raw = self
                    .service
                    .complete(TaskKind::QualityScoring, &repair_prompt)
                    .await
                    .map_err(|e| EngineError::scoring_unavailable(&document.key, &e))?;
                parse_reply::<RawEvaluation>("quality-scoring", &raw).map_err(|_| first_err)?
            }
        };

        Ok(self.build_result(document, evaluation))
    }

    /// Apply clamping, weighting, and the local verdict to a parsed reply.
    fn build_result(&self, document: &SkillDocument, evaluation: RawEvaluation) -> ScoreResult {
        let mut dimensions = BTreeMap::new();
        for dim in self.rubric.dimensions() {
            let Some(raw) = evaluation.scores.get(dim.key) else {
                warn!(doc = %document.key, dimension = dim.key, "dimension missing from reply, scoring 0");
                dimensions.insert(dim.key.to_string(), DimensionScore::default());
                continue;
            };
            dimensions.insert(
                dim.key.to_string(),
                DimensionScore {
                    strengths: raw.strengths.clone(),
                    weaknesses: raw.weaknesses.clone(),
                    suggestions: raw.suggestions.clone(),
                    ..DimensionScore::clamped(raw.score.round() as i64)
                },
            );
        }

        let weighted = self.rubric.weighted_score(&dimensions);
        let result = ScoreResult::new(
            &document.key,
            document.doc_type,
            dimensions,
            weighted,
            evaluation.overall_summary,
            evaluation.top_issues,
        );

        if let Some(service_verdict) = evaluation.verdict {
            if service_verdict != result.verdict.label() {
                debug!(
                    doc = %document.key,
                    service = %service_verdict,
                    local = %result.verdict,
                    "service verdict overridden by weighted score"
                );
            }
        }

        result
    }

    fn build_prompt(&self, document: &SkillDocument) -> String {
        match document.doc_type {
            SkillType::SelfContained => self.self_contained_prompt(&document.content),
            SkillType::Index => self.index_prompt(&document.content),
        }
    }

    fn self_contained_prompt(&self, content: &str) -> String {
        let mut criteria = String::new();
        for dim in self.rubric.dimensions() {
            criteria.push_str(&format!(
                "### {} ({:.0}%)\n",
                dim.name,
                dim.weight * 100.0
            ));
            for question in dim.guidance {
                criteria.push_str(&format!("- {question}\n"));
            }
            criteria.push('\n');
        }

        format!(
            "Assess the quality of the following self-contained skill document \
             (all content in a single file).\n\n\
             ## Evaluation dimensions\n\n{criteria}\
             ## Document to evaluate\n\n```\n{content}\n```\n\n\
             ## Output format (output ONLY the JSON, nothing else)\n\n{OUTPUT_SCHEMA}\n"
        )
    }

    fn index_prompt(&self, content: &str) -> String {
        let mut criteria = String::new();
        for dim in self.rubric.dimensions() {
            criteria.push_str(&format!(
                "### {} ({:.0}%)\n",
                dim.name,
                dim.weight * 100.0
            ));
            for question in dim.index_guidance {
                criteria.push_str(&format!("- {question}\n"));
            }
            criteria.push('\n');
        }

        format!(
            "Assess the quality of the following index skill document. It acts \
             as a navigation directory over a set of rule files; the real code \
             examples and detailed guidance live in the files it references. \
             Apply standards appropriate for an index document.\n\n\
             ## Evaluation dimensions for an index document\n\n{criteria}\
             ## Document to evaluate\n\n```\n{content}\n```\n\n\
             ## Output format (output ONLY the JSON, nothing else)\n\n{OUTPUT_SCHEMA}\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use skillgauge_provider::MockService;
    use skillgauge_types::Verdict;

    use super::*;
    use crate::document::build_document;

    fn reply(scores: &[(&str, i64)], verdict: &str) -> String {
        let entries: Vec<String> = scores
            .iter()
            .map(|(key, score)| format!(r#""{key}": {{"score": {score}}}"#))
            .collect();
        format!(
            r#"{{"scores": {{{}}}, "overall_summary": "ok", "top_issues": [], "verdict": "{verdict}"}}"#,
            entries.join(", ")
        )
    }

    fn doc() -> SkillDocument {
        build_document("demo", "# Demo\n\n## Steps\n\n1. Do the thing\n")
    }

    #[tokio::test]
    async fn weighted_score_and_verdict_computed_locally() {
        // 90*.2 + 95*.25 + 20*.25 + 80*.2 + 90*.1 = 71.75 -> MAYBE, even
        // though the service claims INSTALL.
        let mock = MockService::with_responses(vec![reply(
            &[
                ("trigger_clarity", 90),
                ("structure_completeness", 95),
                ("step_executability", 20),
                ("example_quality", 80),
                ("scope_appropriateness", 90),
            ],
            "INSTALL",
        )]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        let result = scorer.score(&doc()).await.unwrap();
        assert_eq!(result.weighted_score, 71.8);
        assert_eq!(result.verdict, Verdict::Maybe);
    }

    #[tokio::test]
    async fn service_verdict_never_wins() {
        let mock = MockService::with_responses(vec![reply(
            &[
                ("trigger_clarity", 80),
                ("structure_completeness", 80),
                ("example_quality", 80),
                ("step_executability", 80),
                ("scope_appropriateness", 80),
            ],
            "SKIP",
        )]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        let result = scorer.score(&doc()).await.unwrap();
        assert_eq!(result.weighted_score, 80.0);
        assert_eq!(result.verdict, Verdict::Install);
    }

    #[tokio::test]
    async fn out_of_range_scores_clamp() {
        let mock = MockService::with_responses(vec![reply(
            &[
                ("trigger_clarity", 150),
                ("structure_completeness", -10),
                ("step_executability", 50),
                ("example_quality", 50),
                ("scope_appropriateness", 50),
            ],
            "MAYBE",
        )]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        let result = scorer.score(&doc()).await.unwrap();
        assert_eq!(result.dimension_score("trigger_clarity"), 100);
        assert_eq!(result.dimension_score("structure_completeness"), 0);
    }

    #[tokio::test]
    async fn fenced_reply_is_accepted() {
        let fenced = format!("```json\n{}\n```", reply(&[("trigger_clarity", 60)], "SKIP"));
        let mock = MockService::with_responses(vec![fenced]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        let result = scorer.score(&doc()).await.unwrap();
        assert_eq!(result.dimension_score("trigger_clarity"), 60);
    }

    #[tokio::test]
    async fn malformed_reply_repaired_once() {
        let mock = MockService::with_responses(vec![
            "I think this skill is pretty good!".into(),
            reply(&[("trigger_clarity", 70)], "MAYBE"),
        ]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        let result = scorer.score(&doc()).await.unwrap();
        assert_eq!(result.dimension_score("trigger_clarity"), 70);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains("REMINDER"), "repair prompt missing reminder");
    }

    #[tokio::test]
    async fn malformed_twice_fails() {
        let mock =
            MockService::with_responses(vec!["still not json".into(), "not json either".into()]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        let err = scorer.score(&doc()).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse { .. }));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_scoring_unavailable() {
        let mock = MockService::failing();
        let scorer = DimensionScorer::new(&mock).unwrap();

        let err = scorer.score(&doc()).await.unwrap_err();
        match err {
            EngineError::ScoringUnavailable { doc_key, .. } => assert_eq!(doc_key, "demo"),
            other => panic!("expected ScoringUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn index_document_gets_index_prompt() {
        let index_doc = build_document(
            "rules",
            "Quick reference. Read individual rule files:\n`rules/a.md` `rules/b.md` `rules/c.md`\n",
        );
        let mock = MockService::with_responses(vec![reply(&[("trigger_clarity", 50)], "MAYBE")]);
        let scorer = DimensionScorer::new(&mock).unwrap();

        scorer.score(&index_doc).await.unwrap();
        let calls = mock.calls();
        assert!(calls[0].1.contains("index skill document"));
        assert!(calls[0].1.contains("navigation directory"));
    }
}
