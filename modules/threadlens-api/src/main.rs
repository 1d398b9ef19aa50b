use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::CerebrasClient;
use stackexchange_client::StackExchangeClient;
use threadlens_common::Config;
use threadlens_core::{ApiFallback, HttpFetcher, Retriever, Summarizer};

mod rest;

pub struct AppState {
    pub retriever: Retriever,
    pub summarizer: Summarizer,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("threadlens_api=info".parse()?)
                .add_directive("threadlens_core=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let retriever = Retriever::new(
        Arc::new(HttpFetcher::new()),
        Arc::new(ApiFallback::new(StackExchangeClient::new())),
    );
    let summarizer = Summarizer::new(Arc::new(CerebrasClient::new(&config.cerebras_api_key)));

    let state = Arc::new(AppState {
        retriever,
        summarizer,
    });

    let app = Router::new()
        .route("/", get(rest::root))
        .route("/health", get(rest::health))
        .route("/summarize", post(rest::summarize))
        .with_state(state)
        // The extension calls in from arbitrary page origins.
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path per request.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.host, config.port);
    info!("ThreadLens API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
