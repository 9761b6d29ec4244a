use crate::error::{AppError, Result};
use crate::model::{PromptCountPolicy, STYLE_CATALOG};
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_PROMPT_LANGUAGE: &str = "Brazilian Portuguese";
pub const DEFAULT_TRANSLATION_LANGUAGE: &str = "English";

#[derive(Clone, Debug)]
pub struct Config {
    /// Empty when no key is configured yet; the UI can still start and ask for one.
    pub gemini_api_key: String,
    pub model_name: String,
    pub image_model_name: String,
    pub prompt_language: String,
    pub translation_language: String,
    pub prompt_count: PromptCountPolicy,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .unwrap_or_default();

        let strict = env::var("STRICT_PROMPT_COUNT")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self::builder()
            .with_api_key(api_key)
            .with_model(env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()))
            .with_image_model(
                env::var("GEMINI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
            )
            .with_prompt_language(
                env::var("PROMPT_LANGUAGE").unwrap_or_else(|_| DEFAULT_PROMPT_LANGUAGE.to_string()),
            )
            .with_translation_language(
                env::var("TRANSLATION_LANGUAGE")
                    .unwrap_or_else(|_| DEFAULT_TRANSLATION_LANGUAGE.to_string()),
            )
            .with_strict_prompt_count(strict)
            .build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    /// Returns the API key or a [`AppError::MissingEnvVar`] when none is set.
    pub fn require_api_key(&self) -> Result<&str> {
        if self.has_api_key() {
            Ok(self.gemini_api_key.trim())
        } else {
            Err(AppError::MissingEnvVar("GEMINI_API_KEY".to_string()))
        }
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    image_model: Option<String>,
    prompt_language: Option<String>,
    translation_language: Option<String>,
    strict_prompt_count: bool,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    pub fn with_prompt_language(mut self, language: impl Into<String>) -> Self {
        self.prompt_language = Some(language.into());
        self
    }

    pub fn with_translation_language(mut self, language: impl Into<String>) -> Self {
        self.translation_language = Some(language.into());
        self
    }

    pub fn with_strict_prompt_count(mut self, strict: bool) -> Self {
        self.strict_prompt_count = strict;
        self
    }

    pub fn build(self) -> Result<Config> {
        let model_name = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model_name.trim().is_empty() {
            return Err(AppError::config("model name must not be empty"));
        }

        let prompt_count = if self.strict_prompt_count {
            PromptCountPolicy::Exact(STYLE_CATALOG.len())
        } else {
            PromptCountPolicy::Lenient
        };

        Ok(Config {
            gemini_api_key: self.api_key.unwrap_or_default(),
            model_name,
            image_model_name: self
                .image_model
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            prompt_language: self
                .prompt_language
                .unwrap_or_else(|| DEFAULT_PROMPT_LANGUAGE.to_string()),
            translation_language: self
                .translation_language
                .unwrap_or_else(|| DEFAULT_TRANSLATION_LANGUAGE.to_string()),
            prompt_count,
        })
    }
}
