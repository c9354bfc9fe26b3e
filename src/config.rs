use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::model::registry::{DEFAULT_TEXT_MODELS, DEFAULT_VISION_MODELS};
use crate::model::upstream::DEFAULT_ENDPOINT;

pub const CHAT_STORE_FILE: &str = "rico-chats.json";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub upstream_url: String,
    pub site_url: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub data_dir: PathBuf,
    pub text_models: Vec<String>,
    pub vision_models: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENROUTER_API_KEY")
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY is not set"))?;

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", port))?,
            None => 8080,
        };

        let models = |key: &str, defaults: &[&str]| -> Vec<String> {
            match var(key) {
                Some(list) => list
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect(),
                None => defaults.iter().map(|m| m.to_string()).collect(),
            }
        };

        Ok(Self {
            api_key,
            upstream_url: var("OPENROUTER_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            site_url: var("SITE_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            static_dir: var("STATIC_DIR").unwrap_or_else(|| "./public".to_string()).into(),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "./data".to_string()).into(),
            text_models: models("TEXT_MODELS", DEFAULT_TEXT_MODELS),
            vision_models: models("VISION_MODELS", DEFAULT_VISION_MODELS),
        })
    }

    pub fn chat_store_path(&self) -> PathBuf {
        self.data_dir.join(CHAT_STORE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let settings = settings(&[("OPENROUTER_API_KEY", "sk-test")]).expect("valid settings");

        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.upstream_url, DEFAULT_ENDPOINT);
        assert_eq!(settings.site_url, "http://localhost:3000");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.text_models.len(), DEFAULT_TEXT_MODELS.len());
        assert_eq!(settings.chat_store_path(), PathBuf::from("./data").join(CHAT_STORE_FILE));
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("OPENROUTER_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = settings(&[("OPENROUTER_API_KEY", "k"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn model_lists_can_be_overridden() {
        let settings = settings(&[
            ("OPENROUTER_API_KEY", "k"),
            ("TEXT_MODELS", "a/one, b/two ,,"),
            ("VISION_MODELS", "v/one"),
        ])
        .expect("valid settings");

        assert_eq!(settings.text_models, ["a/one", "b/two"]);
        assert_eq!(settings.vision_models, ["v/one"]);
    }
}
