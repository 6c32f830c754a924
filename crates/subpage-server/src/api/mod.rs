//! HTTP API: маршрутизация и состояние приложения.

pub mod page_routes;
pub mod rate_limit;
pub mod sub_routes;
pub mod tv_routes;

use crate::config::ServerConfig;
use crate::services::country_links::CountryLinkAggregator;
use crate::services::store;
use crate::services::tv_service::TvRelay;
use crate::settings::PageSettings;
use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use rate_limit::RateLimiter;
use sea_orm::DatabaseConnection;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const CONTENT_SECURITY_POLICY: &str = "frame-ancestors 'self' https://web.telegram.org https://telegram.org; \
script-src 'self' 'unsafe-inline' https://telegram.org https://cdn.jsdelivr.net https://cdnjs.cloudflare.com; \
style-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com https://cdn.tailwindcss.com";

/// Общее состояние приложения.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub settings: Arc<PageSettings>,
    pub country_links: CountryLinkAggregator,
    pub tv_relay: TvRelay,
    pub rate_limiter: RateLimiter,
}

/// Построить маршрутизатор Axum.
pub fn build_router(state: AppState) -> Router {
    let base = state.config.base_path.clone();
    let limiter = state.rate_limiter.clone();

    // Ограничение по IP только для эндпоинтов с данными подписки
    let limited_routes = Router::new()
        .merge(sub_routes::routes(&base))
        .merge(tv_routes::routes(&base))
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = limiter.clone();
            rate_limit::rate_limit_middleware(limiter, req, next)
        }));

    let static_dir = Path::new(&state.config.web_root).join("static");

    Router::new()
        .route(&format!("{base}health"), get(health_check))
        .merge(page_routes::routes(&base))
        .merge(limited_routes)
        .nest_service(&format!("{base}static"), ServeDir::new(static_dir))
        .layer(cors_layer(&state.config))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Пропущен некорректный CORS-источник: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// GET {base}health: проверка работоспособности сервиса.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = store::ping(&state.db).await;
    Json(serde_json::json!({
        "status": "ok",
        "database": if db_ok { "ok" } else { "unavailable" },
        "module": "xui_subpage"
    }))
}
