//! Translation client and the position-aligned merge of its answer.

use crate::backend::{GenerativeBackend, JsonRequest};
use crate::error::{AppError, Result};
use crate::model::AnalysisResult;
use crate::prompts::{build_translation_prompt, translation_schema};
use serde::Deserialize;

/// Source and target languages of a translation request.
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    pub source_language: String,
    pub target_language: String,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            source_language: crate::config::DEFAULT_PROMPT_LANGUAGE.to_string(),
            target_language: crate::config::DEFAULT_TRANSLATION_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedPrompt {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedPayload {
    detailed_description: Option<String>,
    #[serde(default)]
    prompts: Vec<TranslatedPrompt>,
}

/// Requests a translation of `result` and returns a new result carrying both
/// language variants. `result` itself is never modified.
///
/// # Errors
///
/// Returns [`AppError::Translation`] for empty or malformed answers and
/// [`AppError::TranslationMismatch`] when the prompt list changed length.
pub async fn translate_result(
    backend: &dyn GenerativeBackend,
    result: &AnalysisResult,
    options: &TranslationOptions,
) -> Result<AnalysisResult> {
    let request = JsonRequest {
        instruction: build_translation_prompt(
            result,
            &options.source_language,
            &options.target_language,
        )?,
        image: None,
        schema: translation_schema(),
    };

    tracing::info!(prompts = result.prompts.len(), target = %options.target_language, "requesting translation");
    let text = backend
        .generate_json(request)
        .await?
        .ok_or_else(|| AppError::translation("Empty response from AI"))?;

    merge_translation(result, &text)
}

/// Merges a translation answer into a copy of `original`, index by index.
///
/// Every field must be present; a partial translation is rejected so that
/// translated fields are always populated together.
pub fn merge_translation(original: &AnalysisResult, text: &str) -> Result<AnalysisResult> {
    let payload: TranslatedPayload = serde_json::from_str(text.trim())
        .map_err(|e| AppError::translation(format!("Response does not match schema: {}", e)))?;

    if payload.prompts.len() != original.prompts.len() {
        return Err(AppError::TranslationMismatch {
            expected: original.prompts.len(),
            actual: payload.prompts.len(),
        });
    }

    let description = payload
        .detailed_description
        .ok_or_else(|| AppError::translation("Missing translated description"))?;

    let mut merged = original.clone();
    merged.translated_description = Some(description);
    for (index, (prompt, translated)) in merged.prompts.iter_mut().zip(payload.prompts).enumerate() {
        let (Some(text), Some(description)) = (translated.prompt, translated.description) else {
            return Err(AppError::translation(format!(
                "Prompt {} is missing translated fields",
                index + 1
            )));
        };
        prompt.translated_prompt = Some(text);
        prompt.translated_style_description = Some(description);
    }

    Ok(merged)
}
