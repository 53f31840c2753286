use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

use skillgauge_engine::{DEFAULT_CONCURRENCY, DEFAULT_MIN_QUALITY};
use skillgauge_provider::Endpoint;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[providers]
default = "openai"  # or "ollama"

[providers.openai]
api_key = ""  # Set via OPENAI_API_KEY env var
model = "gpt-4o-mini"
base_url = ""  # Optional: Set via OPENAI_BASE_URL env var

[providers.ollama]
base_url = "http://localhost:11434"
model = "llama3"

[database]
path = "skillgauge.db"

[evaluation]
concurrency = 4      # max concurrent service calls in batch evaluation
min_quality = 50.0   # quality floor for recommendation candidates

[logging]
level = "info"  # trace, debug, info, warn, error
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub default: String,
    pub openai: OpenAIConfig,
    pub ollama: OllamaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_min_quality")]
    pub min_quality: f64,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_min_quality() -> f64 {
    DEFAULT_MIN_QUALITY
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub database: DatabaseConfig,
    pub evaluation: EvaluationConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.skillgauge/skillgauge.toml
    fn global_config_path() -> PathBuf {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".skillgauge")
            .join("skillgauge.toml")
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path();
        let config_dir = config_path.parent().unwrap();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            eprintln!("Created config directory: {}", config_dir.display());
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
            eprintln!("Please edit this file or set environment variables.");
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillgauge/skillgauge.toml (auto-created if missing)
    /// 2. Local override: ./skillgauge.toml (workspace, optional)
    /// 3. Environment variables (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        // Ensure global config exists
        let global_config_path = Self::ensure_global_config()?;

        // Build config with layered sources (later sources override earlier ones)
        let mut config_builder = config::Config::builder()
            // Layer 1: Global config (required - we just created it if missing)
            .add_source(config::File::from(global_config_path))
            // Layer 2: Local workspace config (optional override)
            .add_source(config::File::with_name("skillgauge").required(false))
            // Layer 3: Environment variables with SKILLGAUGE__ prefix
            .add_source(config::Environment::with_prefix("SKILLGAUGE").separator("__"));

        // Layer 4: Apply convenience env var overrides (highest priority)
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            config_builder = config_builder.set_override("providers__openai__api_key", key)?;
        }

        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            config_builder = config_builder.set_override("providers__openai__base_url", url)?;
        }

        if let Ok(url) = env::var("OLLAMA_BASE_URL") {
            config_builder = config_builder.set_override("providers__ollama__base_url", url)?;
        }

        let config = config_builder.build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config)
    }

    /// Endpoint for the configured default provider.
    pub fn endpoint(&self) -> Endpoint {
        match self.providers.default.as_str() {
            "ollama" => Endpoint::Ollama {
                model: self.providers.ollama.model.clone(),
                base_url: self.providers.ollama.base_url.clone(),
            },
            _ => Endpoint::OpenAi {
                model: self.providers.openai.model.clone(),
                api_key: Some(self.providers.openai.api_key.clone())
                    .filter(|k| !k.is_empty()),
                base_url: self
                    .providers
                    .openai
                    .base_url
                    .clone()
                    .filter(|u| !u.is_empty()),
            },
        }
    }
}
