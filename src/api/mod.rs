use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;

use crate::config::Settings;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(*state.settings.upload_limit());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/load", post(handlers::load_csv))
        .route("/upload", post(handlers::upload_csv).layer(upload_limit))
        .route("/data/preview", get(handlers::preview))
        .route("/data/missing", get(handlers::missing_values))
        .route("/sales/by-category", get(handlers::sales_by_category))
        .route("/sales/by-city", get(handlers::sales_by_city))
        .route("/sales/top-products", get(handlers::top_products))
        .route("/sales/quantity-by-product", get(handlers::quantity_by_product))
        .route("/stats/basic", get(handlers::basic_stats))
        .route("/stats/correlation", get(handlers::correlation))
        .route("/report/pdf", post(handlers::generate_pdf))
        .route("/report/pdf/download", get(handlers::download_pdf))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API on `settings.bind()` until the process stops.
pub async fn serve(settings: Settings) -> Result<()> {
    settings.ensure_dirs()?;
    let listener = tokio::net::TcpListener::bind(settings.bind()).await?;
    info!("sales API listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(AppState::new(settings))).await?;
    Ok(())
}
