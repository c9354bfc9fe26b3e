use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProxyError;
use crate::model::ChatMessage;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ChatRequest {
    /// Validates a raw `/api/chat` body. Anything other than a non-empty
    /// array of well-formed messages is rejected before the upstream is
    /// contacted.
    pub fn from_body(body: &[u8]) -> Result<Self, ProxyError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            debug!("Chat body is not JSON: {}", e);
            ProxyError::InvalidRequest
        })?;

        if !value.get("messages").map_or(false, Value::is_array) {
            return Err(ProxyError::InvalidRequest);
        }

        let request: ChatRequest = serde_json::from_value(value).map_err(|e| {
            debug!("Chat body has malformed messages: {}", e);
            ProxyError::InvalidRequest
        })?;

        if request.messages.is_empty() {
            return Err(ProxyError::InvalidRequest);
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveChatRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub history: Vec<ChatMessage>,
}

impl SaveChatRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, ProxyError> {
        let request: SaveChatRequest = serde_json::from_slice(body).map_err(|e| {
            debug!("Malformed chat record: {}", e);
            ProxyError::InvalidChat
        })?;
        if request.history.is_empty() {
            return Err(ProxyError::InvalidChat);
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub text: Vec<String>,
    pub vision: Vec<String>,
}
