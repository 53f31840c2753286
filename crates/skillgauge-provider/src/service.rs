use std::future::Future;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::retry::RetryPolicy;

/// What the engine wants the service to do with a prompt.
///
/// Sent as the task descriptor alongside every request; also used to tag
/// retry/log lines so failures can be attributed to a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    QualityScoring,
    SecurityScanning,
    RelevanceMatching,
    Generation,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::QualityScoring => "quality-scoring",
            Self::SecurityScanning => "security-scanning",
            Self::RelevanceMatching => "relevance-matching",
            Self::Generation => "generation",
        }
    }

    /// System message framing the task for the model.
    fn system_prompt(self) -> &'static str {
        match self {
            Self::QualityScoring => {
                "You are a skill documentation quality assessor. \
                 Follow the rubric and output format in the user message exactly."
            }
            Self::SecurityScanning => {
                "You are a security reviewer for skill documents. \
                 Follow the checklist and output format in the user message exactly."
            }
            Self::RelevanceMatching => {
                "You are a skill recommendation assistant. \
                 Follow the scoring instructions and output format in the user message exactly."
            }
            Self::Generation => {
                "You are an expert at writing high-quality skill documents. \
                 Follow the authoring instructions in the user message exactly."
            }
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The seam the engine is generic over.
///
/// One prompt in, one raw text reply out. Implementations own transport,
/// timeouts and retries; callers own parsing and validation of the reply.
pub trait AnalysisService: Send + Sync {
    /// Send one task-tagged prompt and return the raw text reply.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ServiceUnreachable`] once the implementation
    /// has exhausted its retry budget, or other variants for single-shot
    /// failures.
    fn complete(&self, task: TaskKind, prompt: &str) -> impl Future<Output = Result<String>> + Send;

    fn name(&self) -> &str;
}

/// Which OpenAI-compatible endpoint to talk to.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// Hosted OpenAI-compatible API.
    OpenAi {
        model: String,
        /// Falls back to the `OPENAI_API_KEY` env var when `None`.
        api_key: Option<String>,
        /// Override for proxies or compatible hosts.
        base_url: Option<String>,
    },
    /// Local Ollama server speaking the OpenAI wire format.
    Ollama { model: String, base_url: String },
}

impl Endpoint {
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    fn client(&self) -> Client<OpenAIConfig> {
        match self {
            Self::OpenAi { api_key, base_url, .. } => {
                let mut config = OpenAIConfig::new();
                if let Some(key) = api_key {
                    config = config.with_api_key(key);
                }
                if let Some(url) = base_url {
                    config = config.with_api_base(url);
                }
                Client::with_config(config)
            }
            Self::Ollama { base_url, .. } => {
                // Ollama exposes the OpenAI-compatible API under /v1
                let config = OpenAIConfig::new().with_api_base(format!("{base_url}/v1"));
                Client::with_config(config)
            }
        }
    }
}

/// Production [`AnalysisService`] over an OpenAI-compatible chat endpoint.
pub struct ProviderService {
    endpoint: Endpoint,
    retry: RetryPolicy,
}

impl ProviderService {
    pub fn new(endpoint: Endpoint) -> Self {
        info!("Analysis service initialized: model={}", endpoint.model());
        Self {
            endpoint,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, task: TaskKind, prompt: &str) -> Result<String> {
        let client = self.endpoint.client();

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(task.system_prompt())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.endpoint.model())
            .messages(messages)
            .build()?;

        let response = client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        debug!(task = %task, bytes = content.len(), "service reply received");
        Ok(content)
    }
}

impl AnalysisService for ProviderService {
    async fn complete(&self, task: TaskKind, prompt: &str) -> Result<String> {
        self.retry
            .run(task.label(), || self.request(task, prompt))
            .await
    }

    fn name(&self) -> &str {
        self.endpoint.model()
    }
}
