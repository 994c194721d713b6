//! Configuration for a question-generation run.
//!
//! Every knob lives in one [`GenerationConfig`] value, built once per run
//! through [`GenerationConfigBuilder`] and passed by reference into each
//! stage. Nothing is read from process-wide state once the run has started.

use crate::error::QuizGenError;
use crate::pipeline::assemble::ArtifactFormat;
use crate::pipeline::llm::GenerationCapability;
use crate::pipeline::segment::SegmentationStrategy;
use crate::progress::ProgressCallback;
use crate::prompts::PromptTemplate;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Models offered by the default OpenAI back-end.
pub const SUPPORTED_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini"];

/// Model used when none is chosen.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat-completions endpoint root of the default back-end.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// An API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` when the key is empty or whitespace.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// Configuration for one generation run.
///
/// # Example
/// ```rust
/// use edgequake_quizgen::{GenerationConfig, SegmentationStrategy};
///
/// let config = GenerationConfig::builder()
///     .api_key("sk-test")
///     .model("gpt-4o")
///     .temperature(0.3)
///     .segmentation(SegmentationStrategy::FixedCount(10))
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o");
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Key for the default OpenAI-compatible back-end.
    pub credential: Option<Credential>,

    /// Model identifier. Default: `gpt-4o-mini`.
    pub model: String,

    /// Sampling temperature, 0.0–1.0. Default: 0.7.
    pub temperature: f32,

    /// How the document is cut into segments. Default: split on `+++++`.
    pub segmentation: SegmentationStrategy,

    /// Prompt sent for every segment. Default: the reflective variant.
    pub prompt: PromptTemplate,

    /// Output document format. Default: DOCX.
    pub artifact_format: ArtifactFormat,

    /// Directory the artifact is written to by `generate_to_dir`. Default: `.`.
    pub output_dir: PathBuf,

    /// Completion token cap. `None` leaves it to the service.
    pub max_tokens: Option<usize>,

    /// Root URL of the OpenAI-compatible API.
    pub api_base_url: String,

    /// Timeout for one generation call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Pre-built generation back-end. Takes precedence over everything else.
    pub generator: Option<Arc<dyn GenerationCapability>>,

    /// Pre-built edgequake-llm provider. Used when `generator` is unset.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Named edgequake-llm provider (`openai`, `anthropic`, `ollama`, …).
    /// The provider reads its own API key from the environment.
    pub provider_name: Option<String>,

    /// Per-segment progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            credential: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            segmentation: SegmentationStrategy::default(),
            prompt: PromptTemplate::default(),
            artifact_format: ArtifactFormat::default(),
            output_dir: PathBuf::from("."),
            max_tokens: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            generator: None,
            provider: None,
            provider_name: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("credential", &self.credential)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("segmentation", &self.segmentation)
            .field("prompt", &self.prompt)
            .field("artifact_format", &self.artifact_format)
            .field("output_dir", &self.output_dir)
            .field("max_tokens", &self.max_tokens)
            .field("api_base_url", &self.api_base_url)
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("provider_name", &self.provider_name)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `model` is one the default back-end offers.
    pub fn is_supported_model(model: &str) -> bool {
        SUPPORTED_MODELS.contains(&model)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    /// Set the API key. An empty key leaves the credential unset.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.credential = Credential::new(key);
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = Some(credential);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 1.0);
        self
    }

    pub fn segmentation(mut self, strategy: SegmentationStrategy) -> Self {
        self.config.segmentation = strategy;
        self
    }

    /// Shorthand for [`SegmentationStrategy::Delimiter`].
    pub fn delimiter(self, delimiter: impl Into<String>) -> Self {
        self.segmentation(SegmentationStrategy::Delimiter(delimiter.into()))
    }

    /// Shorthand for [`SegmentationStrategy::FixedCount`].
    pub fn segment_count(self, n: usize) -> Self {
        self.segmentation(SegmentationStrategy::FixedCount(n))
    }

    pub fn prompt(mut self, prompt: impl Into<PromptTemplate>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn artifact_format(mut self, format: ArtifactFormat) -> Self {
        self.config.artifact_format = format;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n.max(1));
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn GenerationCapability>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, QuizGenError> {
        let c = &self.config;
        if !c.temperature.is_finite() {
            return Err(QuizGenError::InvalidConfig(format!(
                "Temperature must be a number in 0.0–1.0, got {}",
                c.temperature
            )));
        }
        if c.model.trim().is_empty() {
            return Err(QuizGenError::InvalidConfig("Model must not be empty".into()));
        }
        c.segmentation.validate()?;
        Ok(self.config)
    }
}
