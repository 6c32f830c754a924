//! Маршруты данных подписки: основная ссылка и ссылки по странам.

use crate::api::AppState;
use crate::error::AppError;
use crate::services::country_links::CountryLink;
use crate::services::subscription_service::{self, SubscriptionInfo};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key_name: Option<String>,
}

impl KeyQuery {
    fn require(self) -> Result<String, AppError> {
        self.key_name
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::BadRequest("Required key_name parameter".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct CountryLinksResponse {
    pub countries: Vec<CountryLink>,
}

pub fn routes(base: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("{base}api/sub"), get(get_subscription))
        .route(&format!("{base}api/country-links"), get(get_country_links))
}

/// GET {base}api/sub: ссылка подписки и срок действия.
async fn get_subscription(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<SubscriptionInfo>, AppError> {
    let key_name = query.require()?;
    let info = subscription_service::get_subscription(
        &state.db,
        &key_name,
        state.settings.happ_cryptolink,
    )
    .await?;
    Ok(Json(info))
}

/// GET {base}api/country-links: VLESS-ссылки по странам.
async fn get_country_links(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<CountryLinksResponse>, AppError> {
    let key_name = query.require()?;
    let countries = state.country_links.country_links(&key_name).await?;
    tracing::debug!("Ключ {key_name}: {} ссылок по странам", countries.len());
    Ok(Json(CountryLinksResponse { countries }))
}
