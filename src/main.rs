// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod session;
mod state;
mod style;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::handlers::{
    apply_preset, create_session, delete_session, get_session, get_style, list_presets,
    list_sessions, restyle, restyled_image, style_domains, update_style_field, upload_image,
};
use crate::services::{GeminiRestyler, ImageProcessor, Restyler, SessionStore};

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionStore>,
    max_upload_bytes: usize,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/presets", web::get().to(list_presets))
            .route("/style/domains", web::get().to(style_domains))
            .route("/sessions", web::post().to(create_session))
            .route("/sessions", web::get().to(list_sessions))
            .route("/sessions/{session_id}", web::get().to(get_session))
            .route("/sessions/{session_id}", web::delete().to(delete_session))
            .route("/sessions/{session_id}/upload", web::post().to(upload_image))
            .route("/sessions/{session_id}/style", web::get().to(get_style))
            .route(
                "/sessions/{session_id}/style",
                web::patch().to(update_style_field),
            )
            .route(
                "/sessions/{session_id}/style/presets/{name}",
                web::post().to(apply_preset),
            )
            .route("/sessions/{session_id}/restyle", web::post().to(restyle))
            .route(
                "/sessions/{session_id}/restyled",
                web::get().to(restyled_image),
            ),
    )
    .route("/health", web::get().to(health_check));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting restyler service...");

    let config = Config::from_env()?;

    // Initialize services
    let processor = Arc::new(ImageProcessor::new(config.max_image_dimension));
    let restyler: Arc<dyn Restyler> =
        Arc::new(GeminiRestyler::new(&config.gemini, Arc::clone(&processor))?);
    info!("Restyling with model {}", restyler.name());

    let sessions = Arc::new(SessionStore::new(restyler, processor));
    Arc::clone(&sessions).spawn_sweeper(
        config.session_idle_timeout,
        config.session_sweep_interval,
    );
    info!(
        "Sessions expire after {}s idle",
        config.session_idle_timeout.as_secs()
    );

    let app_state = AppState {
        sessions,
        max_upload_bytes: config.max_upload_bytes,
    };

    info!("Starting HTTP server on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "restyler",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
