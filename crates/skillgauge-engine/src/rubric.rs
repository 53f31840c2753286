//! Evaluation rubric
//!
//! The dimension catalog is fixed: five axes whose weights sum to 1.0.
//! Weight validation happens at rubric construction so a catalog edit that
//! forgets to rebalance is rejected before any document is scored. Both
//! document types share the catalog keys and weights; only the per-dimension
//! guidance text differs between the self-contained and index prompts, so
//! clamping, weighting, and verdict thresholds exist in exactly one place.

use std::collections::BTreeMap;

use skillgauge_types::DimensionScore;

use crate::error::{EngineError, Result};

/// Weight sums within this distance of 1.0 pass validation.
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// One evaluation axis.
#[derive(Debug, Clone)]
pub struct Dimension {
    /// Human-readable name used in reports.
    pub name: &'static str,
    /// Stable key used in prompts, responses, and result maps.
    pub key: &'static str,
    /// Share of the weighted score, in (0, 1].
    pub weight: f64,
    /// Guiding questions for a self-contained document.
    pub guidance: &'static [&'static str],
    /// Guiding questions for an index document.
    pub index_guidance: &'static [&'static str],
}

/// Validated dimension catalog.
#[derive(Debug, Clone)]
pub struct Rubric {
    dimensions: Vec<Dimension>,
}

impl Rubric {
    /// Validate a catalog: weights must sum to 1.0.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self> {
        let total: f64 = dimensions.iter().map(|d| d.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(EngineError::InvalidRubric { actual: total });
        }
        Ok(Self { dimensions })
    }

    /// The fixed five-dimension catalog.
    pub fn standard() -> Result<Self> {
        Self::new(vec![
            Dimension {
                name: "Trigger clarity",
                key: "trigger_clarity",
                weight: 0.20,
                guidance: &[
                    "Does it state clearly when the skill should be used?",
                    "Are the trigger conditions concrete rather than vague?",
                    "Does it list situations where the skill should NOT be used?",
                ],
                index_guidance: &[
                    "Does it state clearly when this rule set applies?",
                    "Are the trigger descriptions concrete?",
                ],
            },
            Dimension {
                name: "Structure completeness",
                key: "structure_completeness",
                weight: 0.25,
                guidance: &[
                    "Does it state its purpose?",
                    "Does it have clear steps or a workflow?",
                    "Does it include usage examples?",
                    "Does it describe the expected output?",
                ],
                index_guidance: &[
                    "Are the rule categories clearly organized and layered?",
                    "Is there a priority order (what to read first)?",
                    "Is there a how-to-use section?",
                ],
            },
            Dimension {
                name: "Step executability",
                key: "step_executability",
                weight: 0.25,
                guidance: &[
                    "Is every step a concrete action?",
                    "Are the steps in a logical order?",
                    "Does it avoid hedging words like 'try to' or 'consider'?",
                ],
                index_guidance: &[
                    "Can a reader quickly find the rule they need?",
                    "Is the navigation path clear, from entry point to specific rule?",
                    "Is there a quick reference?",
                ],
            },
            Dimension {
                name: "Example quality",
                key: "example_quality",
                weight: 0.20,
                guidance: &[
                    "Is there at least one concrete usage example?",
                    "Do examples show input and expected output?",
                    "Do examples cover the main use cases?",
                ],
                index_guidance: &[
                    "Inline code examples are not required, but each referenced rule \
                     should carry at least a one-line description.",
                    "Are reference paths clear enough to locate?",
                ],
            },
            Dimension {
                name: "Scope appropriateness",
                key: "scope_appropriateness",
                weight: 0.10,
                guidance: &[
                    "Does the skill focus on one well-defined task type?",
                    "Does it avoid being overly broad (like 'help me write code')?",
                    "Does it avoid being overly narrow (one hyper-specific scenario)?",
                ],
                index_guidance: &[
                    "Is the covered topic range reasonable?",
                    "Does the number of rules match the topic's complexity?",
                ],
            },
        ])
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Weighted sum of the per-dimension raw scores, rounded to one decimal.
    ///
    /// A dimension missing from the map contributes zero, matching the
    /// relevance "unscored" convention rather than failing the evaluation.
    pub fn weighted_score(&self, scores: &BTreeMap<String, DimensionScore>) -> f64 {
        let total: f64 = self
            .dimensions
            .iter()
            .map(|d| {
                let raw = scores.get(d.key).map(|s| f64::from(s.score)).unwrap_or(0.0);
                raw * d.weight
            })
            .sum();
        (total * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(&str, u8)]) -> BTreeMap<String, DimensionScore> {
        values
            .iter()
            .map(|(key, score)| ((*key).to_string(), DimensionScore::clamped(i64::from(*score))))
            .collect()
    }

    #[test]
    fn standard_catalog_is_valid() {
        let rubric = Rubric::standard().unwrap();
        assert_eq!(rubric.dimensions().len(), 5);
        let total: f64 = rubric.dimensions().iter().map(|d| d.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unbalanced_catalog_rejected() {
        let mut dimensions = Rubric::standard().unwrap().dimensions.clone();
        dimensions.pop();
        let err = Rubric::new(dimensions).unwrap_err();
        match err {
            EngineError::InvalidRubric { actual } => assert!((actual - 0.9).abs() < 1e-9),
            other => panic!("expected InvalidRubric, got {other:?}"),
        }
    }

    #[test]
    fn weighted_score_matches_hand_calculation() {
        let rubric = Rubric::standard().unwrap();
        let scores = scores(&[
            ("trigger_clarity", 90),
            ("structure_completeness", 95),
            ("step_executability", 20),
            ("example_quality", 80),
            ("scope_appropriateness", 90),
        ]);
        // 90*.2 + 95*.25 + 20*.25 + 80*.2 + 90*.1 = 71.75, rounds to 71.8
        assert_eq!(rubric.weighted_score(&scores), 71.8);
    }

    #[test]
    fn missing_dimension_scores_zero() {
        let rubric = Rubric::standard().unwrap();
        let scores = scores(&[("trigger_clarity", 100)]);
        assert_eq!(rubric.weighted_score(&scores), 20.0);
    }
}
