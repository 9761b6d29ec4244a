//! Analysis client: image plus category in, structured result out.

use crate::backend::{GenerativeBackend, JsonRequest};
use crate::error::{AppError, Result};
use crate::image_processing::EncodedImage;
use crate::model::{AnalysisResult, PromptCountPolicy, STYLE_CATALOG, StyleCategory};
use crate::prompts::{analysis_schema, build_analysis_prompt};

/// Options that shape the analysis request and the validation of its answer.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub language: String,
    pub prompt_count: PromptCountPolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            language: crate::config::DEFAULT_PROMPT_LANGUAGE.to_string(),
            prompt_count: PromptCountPolicy::Lenient,
        }
    }
}

/// Sends one analysis request and returns the validated result.
///
/// # Errors
///
/// Returns [`AppError::Analysis`] when the service answers with no text, with
/// text that does not follow the schema, or (under
/// [`PromptCountPolicy::Exact`]) with the wrong number of prompts.
pub async fn analyze_image(
    backend: &dyn GenerativeBackend,
    image: &EncodedImage,
    category: StyleCategory,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    let request = JsonRequest {
        instruction: build_analysis_prompt(category, &options.language),
        image: Some(image.clone()),
        schema: analysis_schema(),
    };

    tracing::info!(category = %category, "requesting analysis");
    let text = backend
        .generate_json(request)
        .await?
        .ok_or_else(|| AppError::analysis("Empty response from AI"))?;

    parse_analysis(&text, category, options.prompt_count)
}

/// Parses the raw service answer and attaches the requested category.
///
/// The prompt order is kept exactly as delivered.
pub fn parse_analysis(
    text: &str,
    category: StyleCategory,
    policy: PromptCountPolicy,
) -> Result<AnalysisResult> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::analysis("Empty response from AI"));
    }

    let mut result: AnalysisResult = serde_json::from_str(text)
        .map_err(|e| AppError::analysis(format!("Response does not match schema: {}", e)))?;

    // Translation fields only ever come from the translation client
    result.translated_description = None;
    for prompt in &mut result.prompts {
        prompt.translated_prompt = None;
        prompt.translated_style_description = None;
    }
    result.category = Some(category);

    let count = result.prompts.len();
    match policy {
        PromptCountPolicy::Exact(expected) if count != expected => {
            return Err(AppError::analysis(format!(
                "Expected {} prompts, received {}",
                expected, count
            )));
        }
        PromptCountPolicy::Lenient if count != STYLE_CATALOG.len() => {
            tracing::warn!(count, expected = STYLE_CATALOG.len(), "unexpected prompt count");
        }
        _ => {}
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(n: usize) -> String {
        let prompts: Vec<_> = (0..n)
            .map(|i| json!({"style": format!("Style {i}"), "prompt": format!("p{i}"), "description": "d"}))
            .collect();
        json!({"detailedDescription": "a cat", "prompts": prompts}).to_string()
    }

    #[test]
    fn keeps_order_and_count() {
        let result = parse_analysis(&response(30), StyleCategory::Anime, PromptCountPolicy::Lenient).unwrap();
        assert_eq!(result.prompts.len(), 30);
        assert_eq!(result.prompts[0].style, "Style 0");
        assert_eq!(result.prompts[29].prompt, "p29");
        assert_eq!(result.category, Some(StyleCategory::Anime));
        assert_eq!(result.detailed_description, "a cat");
    }

    #[test]
    fn lenient_accepts_short_lists() {
        let result = parse_analysis(&response(7), StyleCategory::Comic, PromptCountPolicy::Lenient).unwrap();
        assert_eq!(result.prompts.len(), 7);
    }

    #[test]
    fn exact_rejects_short_lists() {
        let err = parse_analysis(&response(7), StyleCategory::Comic, PromptCountPolicy::Exact(30)).unwrap_err();
        assert!(matches!(err, AppError::Analysis(_)));
    }

    #[test]
    fn empty_and_malformed_text_fail() {
        for text in ["", "   ", "not json", r#"{"prompts": []}"#, r#"{"detailedDescription": "x"}"#] {
            let err = parse_analysis(text, StyleCategory::GeneralMixed, PromptCountPolicy::Lenient).unwrap_err();
            assert!(matches!(err, AppError::Analysis(_)), "{text}");
        }
    }

    #[test]
    fn prompt_missing_field_fails() {
        let text = r#"{"detailedDescription": "x", "prompts": [{"style": "a", "prompt": "b"}]}"#;
        assert!(parse_analysis(text, StyleCategory::GeneralMixed, PromptCountPolicy::Lenient).is_err());
    }

    #[test]
    fn injected_translation_fields_are_dropped() {
        let text = r#"{"detailedDescription": "x", "translatedDescription": "y",
            "prompts": [{"style": "a", "prompt": "b", "description": "c", "translatedPrompt": "z"}]}"#;
        let result = parse_analysis(text, StyleCategory::GeneralMixed, PromptCountPolicy::Lenient).unwrap();
        assert!(!result.is_translated());
        assert_eq!(result.prompts[0].translated_prompt, None);
    }

    #[test]
    fn unknown_category_in_answer_is_ignored() {
        let text = r#"{"detailedDescription": "x", "category": "Watercolor",
            "prompts": [{"style": "a", "prompt": "b", "description": "c"}]}"#;
        let result = parse_analysis(text, StyleCategory::Realistic, PromptCountPolicy::Lenient).unwrap();
        assert_eq!(result.category, Some(StyleCategory::Realistic));
    }
}
