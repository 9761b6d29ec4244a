use crate::backend::{ContentPart, GenerativeBackend, ImageRequest, JsonRequest};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::image_processing::EncodedImage;
use async_trait::async_trait;
use gemini_rust::{Blob, Content, Gemini, Message, Part, Role};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

pub struct GeminiClient {
    client: Gemini,
    http: reqwest::Client,
    api_key: String,
    image_model: String,
}

fn qualified_model(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

fn map_api_error(context: &str, detail: String) -> AppError {
    if detail.contains("429") || detail.contains("RESOURCE_EXHAUSTED") {
        AppError::RateLimited
    } else {
        AppError::GeminiApi(format!("{}: {}", context, detail))
    }
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        // Explicit base URL avoids the BadScheme error on custom model paths
        let base_url = url::Url::parse(API_BASE)
            .map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;

        let model_url = format!("{}{}", API_BASE, qualified_model(&config.model_name));

        let client = Gemini::with_model_and_base_url(&api_key, model_url, base_url)
            .map_err(|e| AppError::Config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            api_key,
            image_model: config.image_model_name.clone(),
        })
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_json(&self, request: JsonRequest) -> Result<Option<String>> {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = request.image {
            parts.push(Part::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type,
                    data: image.data,
                },
                media_resolution: None,
            });
        }
        parts.push(Part::Text {
            text: request.instruction,
            thought: None,
            thought_signature: None,
        });

        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(parts),
            },
        };

        tracing::debug!(with_image = parts_have_image(&message), "sending structured request");

        let response = self
            .client
            .generate_content()
            .with_messages(vec![message])
            .with_response_mime_type("application/json")
            .with_response_schema(request.schema)
            .execute()
            .await
            .map_err(|e| map_api_error("API request failed", format!("{:?}", e)))?;

        // Concatenate the non-thought text parts of the first candidate
        let mut text = String::new();
        if let Some(candidate) = response.candidates.first() {
            if let Some(parts) = &candidate.content.parts {
                for part in parts {
                    if let Part::Text { text: chunk, thought, .. } = part {
                        if !thought.unwrap_or(false) {
                            text.push_str(chunk);
                        }
                    }
                }
            }
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<Vec<ContentPart>> {
        let url = format!(
            "{}{}:generateContent",
            API_BASE,
            qualified_model(&self.image_model)
        );

        let body = ImageGenerationBody {
            contents: vec![WireContent {
                parts: vec![WireRequestPart { text: request.prompt }],
            }],
            generation_config: WireGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                image_config: WireImageConfig {
                    aspect_ratio: request.aspect_ratio.to_string(),
                },
            },
        };

        tracing::debug!(model = %self.image_model, aspect_ratio = request.aspect_ratio, "requesting image");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::gemini(format!("Image request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_api_error(
                "Image request failed",
                format!("{} - {}", status.as_u16(), text),
            ));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| AppError::gemini(format!("Malformed image response: {}", e)))?;

        Ok(parsed.into_parts())
    }
}

fn parts_have_image(message: &Message) -> bool {
    message
        .content
        .parts
        .as_ref()
        .is_some_and(|parts| parts.iter().any(|p| matches!(p, Part::InlineData { .. })))
}

// Image generation wire types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationBody {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent {
    parts: Vec<WireRequestPart>,
}

#[derive(Debug, Serialize)]
struct WireRequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_modalities: Vec<String>,
    image_config: WireImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireResponseContent>,
}

#[derive(Debug, Deserialize)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponsePart {
    text: Option<String>,
    inline_data: Option<WireInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

impl WireResponse {
    fn into_parts(self) -> Vec<ContentPart> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| match (part.inline_data, part.text) {
                        (Some(blob), _) => Some(ContentPart::InlineImage(EncodedImage::new(
                            blob.mime_type,
                            blob.data,
                        ))),
                        (None, Some(text)) => Some(ContentPart::Text(text)),
                        (None, None) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_are_qualified_once() {
        assert_eq!(qualified_model("gemini-2.5-flash-image"), "models/gemini-2.5-flash-image");
        assert_eq!(qualified_model("models/x"), "models/x");
    }

    #[test]
    fn image_body_uses_camel_case_config() {
        let body = ImageGenerationBody {
            contents: vec![WireContent {
                parts: vec![WireRequestPart { text: "a fox".into() }],
            }],
            generation_config: WireGenerationConfig {
                response_modalities: vec!["IMAGE".into()],
                image_config: WireImageConfig { aspect_ratio: "1:1".into() },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "a fox");
    }

    #[test]
    fn response_parts_keep_order() {
        let raw = r#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inlineData":{"mimeType":"image/png","data":"iVBO"}}
        ]}}]}"#;
        let parsed: WireResponse = serde_json::from_str(raw).unwrap();
        let parts = parsed.into_parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], ContentPart::Text("here you go".into()));
        assert_eq!(
            parts[1],
            ContentPart::InlineImage(EncodedImage::new("image/png", "iVBO"))
        );
    }

    #[test]
    fn empty_response_has_no_parts() {
        let parsed: WireResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.into_parts().is_empty());
    }

    #[test]
    fn rate_limit_is_recognized() {
        assert!(matches!(
            map_api_error("x", "status 429 Too Many Requests".into()),
            AppError::RateLimited
        ));
        assert!(matches!(map_api_error("x", "500".into()), AppError::GeminiApi(_)));
    }

    #[test]
    fn client_requires_key() {
        let config = Config::builder().build().unwrap();
        assert!(matches!(GeminiClient::new(&config), Err(AppError::MissingEnvVar(_))));
    }
}
