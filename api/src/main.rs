use std::net::SocketAddr;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

mod agent;
mod backend;
mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

use agent::{AgentSettings, KidAgent};
use config::AppConfig;
use middleware::rate_limit::RateLimitLayer;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kid Agent API",
        version = "0.1.0",
        description = "Customer support and risk analysis agent for Middlekid. Every reply is routed to a clarification, information or analysis mode."
    ),
    paths(routes::health::health_check, routes::chat::chat),
    components(schemas(
        HealthResponse,
        kid_core::chat::ChatRequest,
        kid_core::chat::ChatResponse,
        kid_core::chat::ConversationTurn,
        kid_core::mode::ResponseMode,
        kid_core::risk::RiskAssessment,
        kid_core::risk::RiskFactors,
        kid_core::risk::RiskLevel,
        kid_core::error::ApiError,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// Which text-generation backend is serving replies ("openai" or "offline")
    pub backend: String,
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// All routes, with the chat rate limit applied when given.
fn app(state: AppState, cors: CorsLayer, chat_limit: Option<RateLimitLayer>) -> Router {
    let chat = routes::chat::router();
    let chat = match chat_limit {
        Some(limit) => chat.layer(limit),
        None => chat,
    };

    Router::new()
        .route("/api-doc/openapi.json", get(openapi_json))
        .merge(routes::health::router())
        .merge(chat)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kid_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let backend = match backend::build(&config.backend) {
        Ok(backend) => backend,
        Err(err) => {
            tracing::error!(error = %err, "could not initialise backend");
            std::process::exit(1);
        }
    };
    if config.backend_name() == "offline" {
        tracing::warn!("OPENAI_API_KEY not set or KID_BACKEND=offline; serving demo replies");
    }

    let chat_limit =
        match middleware::rate_limit::chat_layer(config.chat_rate_per_minute, config.chat_rate_burst) {
            Ok(layer) => layer,
            Err(err) => {
                tracing::error!(error = %err, "invalid rate limit configuration");
                std::process::exit(1);
            }
        };

    let app_state = AppState::new(KidAgent::new(backend, AgentSettings::from(&config)));
    let cors_layer = middleware::cors::build_cors_layer(&config.allowed_origins);
    let app = app(app_state, cors_layer, Some(chat_limit));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        backend = config.backend_name(),
        history_window = config.history_window,
        timeout_secs = config.backend_timeout.as_secs(),
        "Kid agent listening on {}",
        addr
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "could not bind listener");
            std::process::exit(1);
        }
    };
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %err, "server stopped");
        std::process::exit(1);
    }
}
