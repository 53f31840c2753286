//! Test-only scripted analysis service.

use std::sync::{Arc, Mutex};

use crate::error::{ProviderError, Result};
use crate::service::{AnalysisService, TaskKind};

/// Scripted [`AnalysisService`] for tests; no network.
///
/// Responses are consumed front to back, one per call; once the script runs
/// out, `default_response` is returned. Every call is recorded so tests can
/// assert on how many requests went out and what they carried.
#[derive(Debug, Clone)]
pub struct MockService {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<(TaskKind, String)>>>,
    pub default_response: String,
    pub fail: bool,
}

impl Default for MockService {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            fail: false,
        }
    }
}

impl MockService {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    /// A service where every call fails as unreachable.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<(TaskKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl AnalysisService for MockService {
    async fn complete(&self, task: TaskKind, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push((task, prompt.to_string()));

        if self.fail {
            return Err(ProviderError::ServiceUnreachable {
                attempts: 1,
                last_error: "scripted failure".into(),
            });
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
