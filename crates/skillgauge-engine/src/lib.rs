//! Skillgauge Engine - assessment-and-ranking core
//!
//! Turns a raw skill document plus signals from the external analysis
//! service into a deterministic score, verdict, risk level, and ranked
//! recommendation. The service proposes; fixed local policy disposes:
//! verdicts, risk levels, and tiers are always recomputed from raw numeric
//! and categorical signals, never passed through from a service label.
//!
//! Pipelines:
//! - document -> type classifier -> dimension scorer -> (quality score, verdict)
//! - document -> security scanner -> (risk level, recommendation)
//! - documents + profile -> relevance matcher -> ranker -> tiered list

pub mod batch;
pub mod classify;
pub mod document;
pub mod error;
pub mod generate;
mod parse;
pub mod ranker;
pub mod relevance;
pub mod rubric;
pub mod scorer;
pub mod security;

pub use batch::{
    assess, evaluate_all, BatchAnalysis, BatchOptions, BatchOutcome, DocumentOutcome,
    BUCKET_LABELS, DEFAULT_CONCURRENCY,
};
pub use classify::{classify, explain, ClassificationReport};
pub use document::build_document;
pub use error::{EngineError, Result};
pub use generate::generate;
pub use ranker::{rank, recommend, Candidate, DEFAULT_MIN_QUALITY};
pub use relevance::RelevanceMatcher;
pub use rubric::{Dimension, Rubric};
pub use scorer::DimensionScorer;
pub use security::{pattern_scan, SecurityScanner};
