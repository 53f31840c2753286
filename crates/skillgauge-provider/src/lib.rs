//! Skillgauge Provider - client for the external analysis service
//!
//! The engine treats the service as an unreliable collaborator: calls go
//! through a per-call timeout and a bounded retry loop with exponential
//! backoff before `ServiceUnreachable` is surfaced. The [`AnalysisService`]
//! trait is the seam the engine is generic over; production code uses
//! [`ProviderService`] (any OpenAI-compatible endpoint, hosted or local
//! Ollama), tests use the scripted mock behind the `mock` feature.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod service;

pub use error::ProviderError;
pub use retry::RetryPolicy;
pub use service::{AnalysisService, Endpoint, ProviderService, TaskKind};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockService;
