//! Configuration management for protoqa.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.protoqa/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Besides the LLM provider settings it carries the tunables of each stage:
//! segmentation, QA generation and evaluation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the factories know how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Environment variable read for the Gemini key when no provider config names one.
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .protoqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider ("gemini", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Explicit API key (overrides provider-specific env lookup)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Directory for dated log files
    pub log_dir: Option<PathBuf>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    pub segmentation: SegmentationConfig,

    pub generation: GenerationConfig,

    pub evaluation: EvaluationConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider", default = "default_embedding_provider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::Gemini {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Request timeout for Ollama completions.
    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            Self::Ollama { timeout, .. } => *timeout,
            Self::Gemini { .. } => None,
        }
    }
}

/// A literal substring replacement applied to extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Tunables of the section segmentation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentationConfig {
    /// Heading text that ends segmentation (everything after it is dropped)
    pub reference_text: String,

    /// Texts promoted to section names even without a heading path
    pub keep_text: Vec<String>,

    /// Exact element path that carries the document title
    pub title_path: String,

    /// Path fragment marking section headings
    pub heading_marker: String,

    /// Heading texts treated as body text (running headers, URLs)
    pub ignored_headings: Vec<String>,

    /// Maximum characters in one chunk
    pub max_chunk_chars: usize,

    /// Characters shared between consecutive chunks of one section
    pub chunk_overlap: usize,

    /// Replacements applied to element text before segmentation
    pub replacements: Vec<Replacement>,

    /// File looked up in every document folder
    pub target_file: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            reference_text: "References".to_string(),
            keep_text: Vec::new(),
            title_path: "//Document/Figure".to_string(),
            heading_marker: "/H1".to_string(),
            ignored_headings: vec!["www.ace-hta.gov.sg".to_string()],
            max_chunk_chars: 3000,
            chunk_overlap: 100,
            replacements: vec![
                Replacement::new("≥", "more than or equals to"),
                Replacement::new("≤", "less than or equals to"),
            ],
            target_file: "structuredData_edited.json".to_string(),
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.max_chunk_chars == 0 {
            return Err(AppError::Config(
                "segmentation.maxChunkChars must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.max_chunk_chars {
            return Err(AppError::Config(format!(
                "segmentation.chunkOverlap ({}) must be smaller than maxChunkChars ({})",
                self.chunk_overlap, self.max_chunk_chars
            )));
        }
        if self.heading_marker.is_empty() {
            return Err(AppError::Config(
                "segmentation.headingMarker cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tunables of QA pair generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Title used in prompts and references when none is given on the command line
    pub document_title: Option<String>,

    /// Chunks with this many characters or fewer are skipped
    pub min_chunk_chars: usize,

    /// Pause before each LLM request, in seconds
    pub request_delay_secs: u64,

    /// Sampling temperature for generation
    pub temperature: f32,

    /// Replacements applied to chunk text before prompting
    pub replacements: Vec<Replacement>,

    /// Phrases that mark a question as leaning on "the source"
    pub flag_keywords: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            document_title: None,
            min_chunk_chars: 100,
            request_delay_secs: 30,
            temperature: 0.0,
            replacements: vec![
                Replacement::new("\u{2265}", " more than or equals to "),
                Replacement::new("\u{2264}", " less than or equals to "),
                Replacement::new(">", " more than "),
                Replacement::new("<", " less than "),
            ],
            flag_keywords: vec![
                "the source".to_string(),
                "this information".to_string(),
                "these guidelines".to_string(),
                "this source".to_string(),
            ],
        }
    }
}

/// Tunables of answer evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluationConfig {
    /// Metric names run by default
    pub metrics: Vec<String>,

    /// Weights of (statement F1, semantic similarity) in answer correctness
    pub correctness_weights: [f64; 2],

    /// Statements judged per NLI request
    pub nli_batch_size: usize,

    /// Pause before each LLM request, in seconds
    pub request_delay_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            metrics: vec!["faithfulness".to_string()],
            correctness_weights: [0.75, 0.25],
            nli_batch_size: 5,
            request_delay_secs: 30,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.nli_batch_size == 0 {
            return Err(AppError::Config(
                "evaluation.nliBatchSize must be greater than zero".to_string(),
            ));
        }
        let [f1, sim] = self.correctness_weights;
        if f1 < 0.0 || sim < 0.0 || f1 + sim <= 0.0 {
            return Err(AppError::Config(format!(
                "evaluation.correctnessWeights must be non-negative and not both zero: {:?}",
                self.correctness_weights
            )));
        }
        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    segmentation: Option<SegmentationConfig>,
    generation: Option<GenerationConfig>,
    evaluation: Option<EvaluationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    directory: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            log_level: None,
            log_dir: None,
            verbose: false,
            no_color: false,
            llm: None,
            segmentation: SegmentationConfig::default(),
            generation: GenerationConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `PROTOQA_WORKSPACE`: Override workspace path
    /// - `PROTOQA_CONFIG`: Path to config file
    /// - `PROTOQA_PROVIDER`: LLM provider
    /// - `PROTOQA_MODEL`: Model identifier
    /// - `PROTOQA_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("PROTOQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("PROTOQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.protoqa_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("PROTOQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("PROTOQA_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("PROTOQA_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(dir) = logging.directory {
                result.log_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }
            result.llm = Some(llm);
        }

        if let Some(segmentation) = config_file.segmentation {
            result.segmentation = segmentation;
        }
        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(evaluation) = config_file.evaluation {
            result.evaluation = evaluation;
        }

        tracing::debug!("Merged configuration from {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and YAML.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .protoqa directory.
    pub fn protoqa_dir(&self) -> PathBuf {
        self.workspace.join(".protoqa")
    }

    /// Directory holding workspace prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.protoqa_dir().join("prompts")
    }

    /// Get a provider configuration by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Custom endpoint for a provider, if configured.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|p| p.endpoint())
            .map(str::to_string)
    }

    /// Embedding provider name ("trigram" when nothing is configured).
    pub fn embedding_provider(&self) -> String {
        self.llm
            .as_ref()
            .map(|llm| llm.active_embedding_provider.clone())
            .unwrap_or_else(default_embedding_provider)
    }

    /// Embedding model configured for a provider.
    pub fn embedding_model(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|p| p.embedding_model())
            .map(str::to_string)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: explicit key, the provider's `apiKeyEnv`, then `GEMINI_API_KEY`
    /// for the gemini provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::Gemini { api_key_env, .. }) = self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(api_key_env) {
                return Some(key);
            }
        }

        if provider == "gemini" {
            return std::env::var(DEFAULT_GEMINI_KEY_ENV).ok();
        }

        None
    }

    /// Validate configuration for the active provider and every stage.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.provider == "gemini" && self.resolve_api_key("gemini").is_none() {
            let env_var = match self.get_provider_config("gemini") {
                Some(ProviderConfig::Gemini { api_key_env, .. }) => api_key_env.clone(),
                _ => DEFAULT_GEMINI_KEY_ENV.to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        self.segmentation.validate()?;
        self.evaluation.validate()?;

        Ok(())
    }
}
