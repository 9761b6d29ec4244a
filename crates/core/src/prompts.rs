//! Instruction and response-schema builders for the remote service.
//!
//! - [`build_analysis_prompt`]: scene description plus the 30 styled prompts
//! - [`build_translation_prompt`]: translation of the translatable subset
//! - [`analysis_schema`] / [`translation_schema`]: JSON schemas the service must follow

use crate::error::Result;
use crate::model::{AnalysisResult, STYLE_CATALOG, StyleCategory};
use serde::Serialize;
use serde_json::{Value, json};

/// Builds the analysis instruction for the given category.
///
/// The style catalog is listed verbatim and in order.
pub fn build_analysis_prompt(category: StyleCategory, language: &str) -> String {
    let styles = STYLE_CATALOG
        .iter()
        .enumerate()
        .map(|(i, style)| format!("{}. {}", i + 1, style))
        .collect::<Vec<_>>()
        .join("\n");

    let category_label = category.label();
    let category_instruction = category.instruction();
    let count = STYLE_CATALOG.len();

    format!(
        r#"Analyze this image in extreme detail. Identify the main subject/character, their clothing (colors, textures, style), facial features, the environment/landscape, lighting, atmosphere and camera perspective.

USER PREFERENCE: Focus the art direction on "{category_label}".
{category_instruction}

Then, based on this analysis, generate {count} distinct, high quality image generation prompts in the following specific styles (the prompts must be written in {language}):
{styles}

Format the output as a JSON object strictly following this structure:
{{
  "detailedDescription": "Detailed description of the original image in {language}...",
  "prompts": [
    {{ "style": "Style name in {language}", "prompt": "The detailed prompt in {language}...", "description": "Short description of what makes this style unique in this context, in {language}" }},
    ...
  ]
}}"#
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslatablePrompt<'a> {
    style: &'a str,
    prompt: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslatableResult<'a> {
    detailed_description: &'a str,
    prompts: Vec<TranslatablePrompt<'a>>,
}

/// Builds the translation instruction carrying only the translatable subset
/// of `result`, serialized as JSON.
pub fn build_translation_prompt(result: &AnalysisResult, source: &str, target: &str) -> Result<String> {
    let payload = TranslatableResult {
        detailed_description: &result.detailed_description,
        prompts: result
            .prompts
            .iter()
            .map(|p| TranslatablePrompt {
                style: &p.style,
                prompt: &p.prompt,
                description: &p.description,
            })
            .collect(),
    };
    let payload = serde_json::to_string(&payload)?;
    let count = result.prompts.len();

    Ok(format!(
        r#"Translate the following JSON content from {source} to {target}.
Keep the translations natural, artistic, and precise for image generation contexts.
Do NOT translate the "style" names if they are already standard, but ensure the "detailedDescription", "prompts[].prompt", and "prompts[].description" are in {target}.
Return exactly {count} prompts, in the same order as the input.

JSON to translate:
{payload}"#
    ))
}

fn prompt_item_schema(required: bool) -> Value {
    let mut item = json!({
        "type": "OBJECT",
        "properties": {
            "style": { "type": "STRING" },
            "prompt": { "type": "STRING" },
            "description": { "type": "STRING" }
        }
    });
    if required {
        item["required"] = json!(["style", "prompt", "description"]);
    }
    item
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "detailedDescription": { "type": "STRING" },
            "prompts": { "type": "ARRAY", "items": prompt_item_schema(true) }
        },
        "required": ["detailedDescription", "prompts"]
    })
}

pub fn translation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "detailedDescription": { "type": "STRING" },
            "prompts": { "type": "ARRAY", "items": prompt_item_schema(false) }
        },
        "required": ["detailedDescription", "prompts"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeneratedPrompt;

    #[test]
    fn analysis_prompt_lists_catalog_in_order() {
        let prompt = build_analysis_prompt(StyleCategory::Anime, "English");
        let first = prompt.find("1. Surreal and Ethereal Dreamscape").unwrap();
        let last = prompt.find("30. Glitch Art").unwrap();
        assert!(first < last);
        assert!(prompt.contains("Focus the art direction on \"Anime\""));
        assert!(prompt.contains("generate 30 distinct"));
    }

    #[test]
    fn translation_prompt_drops_translated_fields() {
        let mut result = AnalysisResult {
            detailed_description: "um gato".into(),
            translated_description: None,
            prompts: vec![GeneratedPrompt::new("Neon Noir", "gato neon", "luzes")],
            category: Some(StyleCategory::Realistic),
        };
        result.prompts[0].translated_prompt = Some("stale".into());

        let prompt = build_translation_prompt(&result, "Brazilian Portuguese", "English").unwrap();
        assert!(prompt.contains(r#""detailedDescription":"um gato""#));
        assert!(prompt.contains(r#""style":"Neon Noir""#));
        assert!(!prompt.contains("stale"));
        assert!(!prompt.contains("category"));
        assert!(prompt.contains("Return exactly 1 prompts"));
    }

    #[test]
    fn analysis_schema_requires_all_prompt_fields() {
        let schema = analysis_schema();
        assert_eq!(
            schema["properties"]["prompts"]["items"]["required"],
            json!(["style", "prompt", "description"])
        );
        assert!(translation_schema()["properties"]["prompts"]["items"]["required"].is_null());
    }
}
