//! Domain types shared by the clients, the state machine and the front-ends.
//!
//! Field names serialize in camelCase so that the structures match the JSON
//! exchanged with the remote service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed, ordered style catalog sent verbatim in the analysis instruction.
pub const STYLE_CATALOG: [&str; 30] = [
    "Surreal and Ethereal Dreamscape",
    "Retro 16-bit Pixel Art",
    "Vibrant Impressionist Oil Painting",
    "Detailed Charcoal and Graphite Sketch",
    "Cyberpunk Digital Art",
    "Modern Pixar-style 3D Render",
    "Detailed Pencil Sketch",
    "Studio Ghibli-style Anime",
    "Hyper-Realistic Photography",
    "Cinematic Film Still",
    "Dark Fantasy Art",
    "Low Poly Art",
    "Vaporwave Aesthetic",
    "Japanese Ukiyo-e Woodblock Print",
    "Art Nouveau Illustration",
    "Gothic Portrait Painting",
    "Flat Minimalist Design",
    "Neon Noir",
    "Fantasy Concept Art",
    "Western Comic Book Style",
    "Black and White Manga",
    "Steampunk Illustration",
    "Surreal Horror Art",
    "Photorealistic Studio Portrait",
    "Matte Painting (Cinematic Background)",
    "Watercolor Illustration",
    "Ink Wash Illustration (Sumi-e)",
    "Retrofuturism",
    "Claymation Style",
    "Glitch Art",
];

/// Short labels for the catalog entries, in the same order.
pub const STYLE_LABELS: [&str; 30] = [
    "Surreal Ethereal",
    "Pixel Art 16-bit",
    "Impressionist",
    "Charcoal & Graphite",
    "Cyberpunk",
    "3D Pixar",
    "Pencil Sketch",
    "Studio Ghibli",
    "Hyper-Realistic",
    "Cinematic",
    "Dark Fantasy",
    "Low Poly",
    "Vaporwave",
    "Ukiyo-e",
    "Art Nouveau",
    "Gothic Portrait",
    "Flat Minimalist",
    "Neon Noir",
    "Fantasy Concept",
    "Western Comic",
    "B&W Manga",
    "Steampunk",
    "Surreal Horror",
    "Studio Photoreal",
    "Matte Painting",
    "Watercolor",
    "Ink Wash",
    "Retrofuturism",
    "Claymation",
    "Glitch Art",
];

/// Artistic direction chosen before analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleCategory {
    #[default]
    #[serde(rename = "General/Mixed")]
    GeneralMixed,
    Realistic,
    Anime,
    #[serde(rename = "3D")]
    ThreeD,
    #[serde(rename = "Artistic Sketch")]
    ArtisticSketch,
    Comic,
}

impl StyleCategory {
    /// All categories in selector order.
    pub const ALL: [StyleCategory; 6] = [
        StyleCategory::GeneralMixed,
        StyleCategory::Realistic,
        StyleCategory::Anime,
        StyleCategory::ThreeD,
        StyleCategory::ArtisticSketch,
        StyleCategory::Comic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneralMixed => "General/Mixed",
            Self::Realistic => "Realistic",
            Self::Anime => "Anime",
            Self::ThreeD => "3D",
            Self::ArtisticSketch => "Artistic Sketch",
            Self::Comic => "Comic",
        }
    }

    /// Instruction fragment biasing every style toward this category.
    pub fn instruction(&self) -> String {
        match self {
            Self::GeneralMixed => {
                "Keep the most authentic representation for each individual style.".to_string()
            }
            Self::Comic => "Strongly lean the overall aesthetic toward a Western comic book style \
                (bold line work, dynamic action poses, halftone dots and dramatic ink shadows). \
                Even photographic or painterly styles should carry a comic book touch."
                .to_string(),
            other => format!(
                "While following the unique requirements of each style, strongly lean the overall \
                aesthetic toward the \"{}\" aesthetic. For example, if the category is Anime, even a \
                \"Realistic Photography\" style should look like high quality cinematic anime realism.",
                other.label()
            ),
        }
    }
}

impl fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StyleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "generalmixed" | "general" | "mixed" => Ok(Self::GeneralMixed),
            "realistic" => Ok(Self::Realistic),
            "anime" => Ok(Self::Anime),
            "3d" | "threed" => Ok(Self::ThreeD),
            "artisticsketch" | "sketch" => Ok(Self::ArtisticSketch),
            "comic" | "comics" => Ok(Self::Comic),
            _ => Err(format!("unknown style category: {s}")),
        }
    }
}

/// One styled prompt returned by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPrompt {
    /// Display name; also the identity key used by copy and preview affordances.
    pub style: String,
    pub prompt: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_style_description: Option<String>,
}

impl GeneratedPrompt {
    pub fn new(
        style: impl Into<String>,
        prompt: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            style: style.into(),
            prompt: prompt.into(),
            description: description.into(),
            translated_prompt: None,
            translated_style_description: None,
        }
    }

    /// Prompt text in the requested language, falling back to the original.
    pub fn prompt_text(&self, translated: bool) -> &str {
        match (&self.translated_prompt, translated) {
            (Some(t), true) => t,
            _ => &self.prompt,
        }
    }

    pub fn description_text(&self, translated: bool) -> &str {
        match (&self.translated_style_description, translated) {
            (Some(t), true) => t,
            _ => &self.description,
        }
    }
}

/// Structured result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub detailed_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_description: Option<String>,
    pub prompts: Vec<GeneratedPrompt>,
    /// Set from the request, never read from the service's answer.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub category: Option<StyleCategory>,
}

impl AnalysisResult {
    /// Translation fields are written together, so the description alone tells.
    pub fn is_translated(&self) -> bool {
        self.translated_description.is_some()
    }

    pub fn description_text(&self, translated: bool) -> &str {
        match (&self.translated_description, translated) {
            (Some(t), true) => t,
            _ => &self.detailed_description,
        }
    }

    pub fn find_prompt(&self, style: &str) -> Option<&GeneratedPrompt> {
        self.prompts.iter().find(|p| p.style == style)
    }
}

/// How strictly the number of returned prompts is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptCountPolicy {
    /// Accept whatever count the service delivered.
    #[default]
    Lenient,
    /// Reject results that do not carry exactly this many prompts.
    Exact(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_and_labels_line_up() {
        assert_eq!(STYLE_CATALOG.len(), STYLE_LABELS.len());
        assert_eq!(STYLE_CATALOG[1], "Retro 16-bit Pixel Art");
        assert_eq!(STYLE_CATALOG[29], "Glitch Art");
    }

    #[test]
    fn category_parses_labels_and_cli_names() {
        for category in StyleCategory::ALL {
            assert_eq!(category.label().parse::<StyleCategory>(), Ok(category));
        }
        assert_eq!("artistic-sketch".parse(), Ok(StyleCategory::ArtisticSketch));
        assert_eq!("GENERAL".parse(), Ok(StyleCategory::GeneralMixed));
        assert!("watercolor".parse::<StyleCategory>().is_err());
    }

    #[test]
    fn category_instruction_mentions_label() {
        assert!(StyleCategory::Anime.instruction().contains("\"Anime\""));
        assert!(StyleCategory::Comic.instruction().contains("Western comic"));
        assert!(!StyleCategory::GeneralMixed.instruction().contains("lean"));
    }

    #[test]
    fn result_deserializes_from_service_shape() {
        let json = r#"{
            "detailedDescription": "a cat",
            "prompts": [{"style": "Pixel Art", "prompt": "a pixel cat", "description": "8 colors"}]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.detailed_description, "a cat");
        assert_eq!(result.prompts[0].style, "Pixel Art");
        assert!(!result.is_translated());
        assert_eq!(result.category, None);
    }

    #[test]
    fn text_accessors_fall_back_to_original() {
        let mut prompt = GeneratedPrompt::new("Neon Noir", "rua molhada", "neon");
        assert_eq!(prompt.prompt_text(true), "rua molhada");
        prompt.translated_prompt = Some("wet street".into());
        assert_eq!(prompt.prompt_text(true), "wet street");
        assert_eq!(prompt.prompt_text(false), "rua molhada");
        assert_eq!(prompt.description_text(true), "neon");
    }
}
