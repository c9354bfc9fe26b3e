mod config;
mod error;
mod history;
mod model;
mod web;

use std::sync::Arc;

use actix_files as fs;
use actix_web::middleware::Logger;
use actix_web::{web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};

use config::Settings;
use history::ChatStore;
use model::fallback::FallbackChain;
use model::registry::ModelRegistry;
use model::upstream::OpenRouterClient;
use web::routes;

// App state structure
struct AppState {
    chain: FallbackChain,
    chats: ChatStore,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting RicoAI proxy");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let upstream = match OpenRouterClient::new(
        &settings.upstream_url,
        &settings.api_key,
        &settings.site_url,
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize upstream client: {:#}", e);
            std::process::exit(1);
        }
    };

    let registry =
        ModelRegistry::new(settings.text_models.clone(), settings.vision_models.clone());
    info!(
        "Model registry: {} text, {} vision candidate(s)",
        registry.text_models().len(),
        registry.vision_models().len()
    );

    let chats = match ChatStore::open(settings.chat_store_path()) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open chat store: {:#}", e);
            std::process::exit(1);
        }
    };

    let app_state = Data::new(AppState {
        chain: FallbackChain::new(Arc::new(upstream), registry),
        chats,
    });

    let static_dir = settings.static_dir.clone();
    if static_dir.is_dir() {
        info!("Serving client from {}", static_dir.display());
    } else {
        warn!("Static directory {} not found; serving API only", static_dir.display());
    }

    info!("Listening on {}:{}", settings.host, settings.port);

    // Start web server
    HttpServer::new(move || {
        let app = App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(routes::configure);

        if static_dir.is_dir() {
            app.service(fs::Files::new("/", &static_dir).index_file("index.html"))
        } else {
            app
        }
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
