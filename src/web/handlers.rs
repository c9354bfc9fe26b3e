use actix_web::{web, HttpResponse, Responder};
use anyhow::anyhow;
use log::info;
use serde_json::json;

use crate::error::ProxyError;
use crate::history::ChatStore;
use crate::web::models::{ChatRequest, ChatResponse, ModelsResponse, SaveChatRequest};
use crate::AppState;

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Chat API endpoint
pub async fn chat(
    data: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ProxyError> {
    let request = ChatRequest::from_body(&body)?;

    info!(
        "Chat request: {} message(s), requested model: {}",
        request.messages.len(),
        request.model.as_deref().unwrap_or("<default>")
    );

    let completion = data
        .chain
        .run(&request.messages, request.model.as_deref())
        .await?;

    info!(
        "Response length: {} characters from {}",
        completion.content.len(),
        completion.model
    );

    Ok(HttpResponse::Ok().json(ChatResponse {
        message: completion.content,
        model: completion.model,
    }))
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({ "error": "Method not allowed" }))
}

// Candidate lists, for the client's model picker
pub async fn models(data: web::Data<AppState>) -> impl Responder {
    let registry = data.chain.registry();
    HttpResponse::Ok().json(ModelsResponse {
        text: registry.text_models().to_vec(),
        vision: registry.vision_models().to_vec(),
    })
}

pub async fn list_chats(data: web::Data<AppState>) -> Result<HttpResponse, ProxyError> {
    let chats = with_store(data, |store| store.list()).await?;
    Ok(HttpResponse::Ok().json(chats))
}

pub async fn get_chat(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ProxyError> {
    let id = id.into_inner();
    let chat = with_store(data, move |store| store.get(&id))
        .await?
        .ok_or(ProxyError::ChatNotFound)?;
    Ok(HttpResponse::Ok().json(chat))
}

pub async fn save_chat(
    data: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ProxyError> {
    let request = SaveChatRequest::from_body(&body)?;
    let saved = with_store(data, move |store| {
        store.save(request.id.as_deref(), request.history)
    })
    .await?;
    info!("Saved chat {} ({} message(s))", saved.id, saved.history.len());
    Ok(HttpResponse::Ok().json(saved))
}

pub async fn delete_chat(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ProxyError> {
    let id = id.into_inner();
    let target = id.clone();
    if with_store(data, move |store| store.delete(&target)).await? {
        info!("Deleted chat {}", id);
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ProxyError::ChatNotFound)
    }
}

// Store calls do file IO under a lock; keep them off the async workers
async fn with_store<T, F>(data: web::Data<AppState>, f: F) -> Result<T, ProxyError>
where
    F: FnOnce(&ChatStore) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = web::block(move || f(&data.chats))
        .await
        .map_err(|e| anyhow!("chat store task failed: {}", e))?;
    Ok(result?)
}
