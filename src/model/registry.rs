use crate::model::{contains_image, ChatMessage};

/// Text models tried after the caller's choice, highest priority first.
pub const DEFAULT_TEXT_MODELS: &[&str] = &[
    "mistralai/mistral-7b-instruct",
    "meta-llama/llama-3.1-8b-instruct:free",
    "google/gemma-2-9b-it:free",
    "qwen/qwen-2.5-7b-instruct:free",
    "microsoft/phi-3-mini-128k-instruct:free",
];

/// Models able to read `image_url` parts.
pub const DEFAULT_VISION_MODELS: &[&str] = &[
    "google/gemini-2.0-flash-exp:free",
    "meta-llama/llama-3.2-11b-vision-instruct:free",
    "qwen/qwen2.5-vl-72b-instruct:free",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Text,
    Vision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub branch: Branch,
    pub models: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    text: Vec<String>,
    vision: Vec<String>,
}

impl ModelRegistry {
    pub fn new(
        text: impl IntoIterator<Item = String>,
        vision: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            text: dedup(text),
            vision: dedup(vision),
        }
    }

    pub fn text_models(&self) -> &[String] {
        &self.text
    }

    pub fn vision_models(&self) -> &[String] {
        &self.vision
    }

    /// The requested model (if any) followed by the text fallbacks.
    pub fn text_candidates(&self, requested: Option<&str>) -> Vec<String> {
        let requested = requested
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        dedup(requested.into_iter().chain(self.text.iter().cloned()))
    }

    /// Picks the candidate list for a conversation. Image content always
    /// routes to the vision list, whatever model the caller asked for.
    pub fn select(&self, messages: &[ChatMessage], requested: Option<&str>) -> Selection {
        if contains_image(messages) {
            Selection {
                branch: Branch::Vision,
                models: self.vision.clone(),
            }
        } else {
            Selection {
                branch: Branch::Text,
                models: self.text_candidates(requested),
            }
        }
    }
}

fn dedup(models: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for model in models {
        if !seen.contains(&model) {
            seen.push(model);
        }
    }
    seen
}
