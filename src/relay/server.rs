//! HTTP server setup and configuration.

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers;
use crate::config::Config;
use crate::upstream::{ContentGenerator, GeminiClient};

/// Response header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ContentGenerator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(generator: Arc<dyn ContentGenerator>, config: Config) -> Self {
        Self {
            generator,
            config: Arc::new(config),
        }
    }
}

/// Correlation id assigned to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assign a [`RequestId`] and echo it back in the `x-request-id` header.
async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = RequestId(Uuid::new_v4());
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(ToString::to_string)
            .unwrap_or_default();
        tracing::info_span!(
            "http",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let body_limit = match state.config.server.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .layer(body_limit)
        .with_state(state)
        .layer(trace)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(assign_request_id))
}

/// Run the HTTP server.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let listen_addr = config.server.listen.clone();

    let client = GeminiClient::new(&config.upstream)?;
    tracing::info!(
        model = %config.upstream.model,
        endpoint = %client.endpoint(),
        error_mode = ?config.relay.error_mode,
        "Configured upstream"
    );

    let state = AppState::new(Arc::new(client), config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Starting gemini-relay server");

    axum::serve(listener, app).await?;

    Ok(())
}
