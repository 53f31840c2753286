//! Batch evaluation pipeline
//!
//! Fans out per-document scoring with a bounded number of outstanding
//! external calls; unbounded fan-out would exhaust the service quota, so the
//! semaphore is a correctness measure, not an optimization. Per-document
//! failures never abort the batch, and cancellation returns every outcome
//! obtained so far instead of discarding partial progress.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use skillgauge_provider::AnalysisService;
use skillgauge_types::{ScanResult, ScoreResult, SkillDocument, Verdict};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::scorer::DimensionScorer;
use crate::security::SecurityScanner;

/// Default cap on concurrent outstanding external calls.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum concurrent outstanding external calls.
    pub concurrency: usize,
    /// Cancelling stops unstarted and in-flight work; completed results are
    /// still returned.
    pub cancel: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }
}

/// What happened to one document in a batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Scored(ScoreResult),
    /// Scoring failed for this document; the batch continued.
    Failed(EngineError),
    /// The batch was cancelled before this document completed.
    Cancelled,
}

/// Per-document outcome, in input order.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub key: String,
    pub outcome: BatchOutcome,
}

impl DocumentOutcome {
    pub fn score(&self) -> Option<&ScoreResult> {
        match &self.outcome {
            BatchOutcome::Scored(result) => Some(result),
            _ => None,
        }
    }
}

/// Quality-score and security-scan one document concurrently.
///
/// The two pipelines are independent and produce independent outputs; they
/// share only the per-call rate limiting inside the service client.
pub async fn assess<S: AnalysisService>(
    service: &S,
    document: &SkillDocument,
) -> Result<(ScoreResult, ScanResult)> {
    let scorer = DimensionScorer::new(service)?;
    let scanner = SecurityScanner::new(service);

    let (score, scan) = tokio::join!(scorer.score(document), scanner.scan(document));
    Ok((score?, scan?))
}

/// Score every document, bounding concurrent external calls.
///
/// Returns one outcome per input document, in input order. A document whose
/// scoring fails carries its error; documents not finished when `cancel`
/// fires are reported as [`BatchOutcome::Cancelled`].
///
/// # Errors
///
/// Only rubric validation can fail the whole batch; per-document errors are
/// captured in the outcomes.
pub async fn evaluate_all<S: AnalysisService>(
    service: &S,
    documents: &[SkillDocument],
    options: &BatchOptions,
) -> Result<Vec<DocumentOutcome>> {
    let scorer = DimensionScorer::new(service)?;
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));

    let tasks = documents.iter().map(|document| {
        let semaphore = Arc::clone(&semaphore);
        let cancel = options.cancel.clone();
        let scorer = &scorer;
        async move {
            let permit = tokio::select! {
                _ = cancel.cancelled() => None,
                permit = semaphore.acquire() => permit.ok(),
            };
            let Some(_permit) = permit else {
                return DocumentOutcome {
                    key: document.key.clone(),
                    outcome: BatchOutcome::Cancelled,
                };
            };

            let outcome = tokio::select! {
                _ = cancel.cancelled() => BatchOutcome::Cancelled,
                result = scorer.score(document) => match result {
                    Ok(score) => BatchOutcome::Scored(score),
                    Err(e) => BatchOutcome::Failed(e),
                },
            };
            DocumentOutcome {
                key: document.key.clone(),
                outcome,
            }
        }
    });

    let outcomes = join_all(tasks).await;

    let scored = outcomes.iter().filter(|o| o.score().is_some()).count();
    info!(
        total = outcomes.len(),
        scored,
        "batch evaluation finished"
    );
    Ok(outcomes)
}

/// Distribution summary over a set of quality evaluations.
///
/// Surfaces the shape of the scored corpus and any score/verdict
/// inconsistencies in loaded data (a cached result whose stored verdict
/// disagrees with its stored score points at a stale or hand-edited cache).
#[derive(Debug, Serialize)]
pub struct BatchAnalysis {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Counts for the 0-25, 26-50, 51-74, 75-100 score buckets.
    pub buckets: [usize; 4],
    pub install: usize,
    pub maybe: usize,
    pub skip: usize,
    /// Highest-scoring entries, (key, weighted score), best first.
    pub top: Vec<(String, f64)>,
    /// Lowest-scoring entries, (key, weighted score), worst first.
    pub bottom: Vec<(String, f64)>,
    /// Entries whose stored verdict disagrees with their stored score.
    pub inconsistencies: Vec<(String, f64, Verdict)>,
}

/// Bucket labels matching [`BatchAnalysis::buckets`].
pub const BUCKET_LABELS: [&str; 4] = ["0-25", "26-50", "51-74", "75-100"];

impl BatchAnalysis {
    /// Summarize a set of evaluations; `None` when there is nothing to
    /// analyze.
    pub fn from_results(results: &[&ScoreResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let scores: Vec<f64> = results.iter().map(|r| r.weighted_score).collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;

        let mut buckets = [0usize; 4];
        for score in &scores {
            let idx = if *score <= 25.0 {
                0
            } else if *score <= 50.0 {
                1
            } else if *score < 75.0 {
                2
            } else {
                3
            };
            buckets[idx] += 1;
        }

        let mut by_score: Vec<&&ScoreResult> = results.iter().collect();
        by_score.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
        let top = by_score
            .iter()
            .take(5)
            .map(|r| (r.doc_key.clone(), r.weighted_score))
            .collect();
        let bottom = by_score
            .iter()
            .rev()
            .take(5)
            .map(|r| (r.doc_key.clone(), r.weighted_score))
            .collect();

        let inconsistencies = results
            .iter()
            .filter(|r| {
                (r.weighted_score >= 70.0 && r.verdict == Verdict::Skip)
                    || (r.weighted_score < 50.0 && r.verdict == Verdict::Install)
            })
            .map(|r| (r.doc_key.clone(), r.weighted_score, r.verdict))
            .collect();

        Some(Self {
            count: results.len(),
            mean: (mean * 10.0).round() / 10.0,
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            buckets,
            install: results.iter().filter(|r| r.verdict == Verdict::Install).count(),
            maybe: results.iter().filter(|r| r.verdict == Verdict::Maybe).count(),
            skip: results.iter().filter(|r| r.verdict == Verdict::Skip).count(),
            top,
            bottom,
            inconsistencies,
        })
    }
}
