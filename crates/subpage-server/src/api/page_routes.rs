//! Страница подключения, её настройки и тексты.

use crate::api::AppState;
use crate::settings::{HolidaySettings, LanguageSettings, OrderTable, PageSettings};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_VERSION: &str = "1.0.0";

pub fn routes(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(index_page))
        .route(&format!("{base}api/settings"), get(get_settings))
        .route(&format!("{base}api/texts"), get(get_texts))
        .route(&format!("{base}auth/start"), post(auth_start))
}

/// GET {base}: index.html с подставленными значениями.
async fn index_page(State(state): State<AppState>) -> Html<String> {
    let root = Path::new(&state.config.web_root);

    let version = match tokio::fs::read_to_string(root.join("VERSION")).await {
        Ok(v) => v.trim().to_string(),
        Err(_) => DEFAULT_VERSION.to_string(),
    };

    let settings = &state.settings;
    match tokio::fs::read_to_string(root.join("static").join("index.html")).await {
        Ok(template) => Html(render_index(
            &template,
            &[
                ("PROJECT_NAME", settings.project_name.as_str()),
                ("WEBHOOK_HOST", state.config.button_domain()),
                ("SUPPORT_CHAT_URL", settings.support_chat.as_str()),
                ("USERNAME_BOT", settings.bot_username.as_str()),
                ("BASE_PATH", state.config.base_path.as_str()),
                ("VERSION", version.as_str()),
            ],
        )),
        Err(e) => {
            tracing::warn!("index.html недоступен: {e}");
            Html(format!(
                "<h1>Подключение устройства</h1><p>Модуль xui_subpage активирован для {}</p>",
                settings.project_name
            ))
        }
    }
}

/// Заменить `{{NAME}}` на значения.
fn render_index(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |content, (name, value)| {
            content.replace(&format!("{{{{{name}}}}}"), value)
        })
}

#[derive(Serialize)]
struct SettingsResponse<'a> {
    project_name: &'a str,
    bot_username: &'a str,
    support_chat: &'a str,
    webhook_host: &'a str,
    base_path: &'a str,
    color_theme: &'a str,
    gradient_colors: &'a BTreeMap<String, String>,
    language: &'a LanguageSettings,
    apps: &'a OrderTable,
    deeplinks: &'a BTreeMap<String, String>,
    app_links: &'a BTreeMap<String, BTreeMap<String, String>>,
    buttons: &'a OrderTable,
    happ_cryptolink: bool,
    haptic_enabled: bool,
    vless_selector_enabled: bool,
    holidays: &'a HolidaySettings,
}

impl<'a> SettingsResponse<'a> {
    fn new(settings: &'a PageSettings, webhook_host: &'a str, base_path: &'a str) -> Self {
        Self {
            project_name: &settings.project_name,
            bot_username: &settings.bot_username,
            support_chat: &settings.support_chat,
            webhook_host,
            base_path,
            color_theme: &settings.theme,
            gradient_colors: &settings.gradient_colors,
            language: &settings.language,
            apps: &settings.apps,
            deeplinks: &settings.deeplinks,
            app_links: &settings.app_links,
            buttons: &settings.buttons,
            happ_cryptolink: settings.happ_cryptolink,
            haptic_enabled: settings.haptic_enabled,
            vless_selector_enabled: settings.vless_selector_enabled,
            holidays: &settings.holidays,
        }
    }
}

/// GET {base}api/settings: настройки страницы, без кеширования.
async fn get_settings(State(state): State<AppState>) -> Response {
    let body = SettingsResponse::new(
        &state.settings,
        state.config.button_domain(),
        &state.config.base_path,
    );
    (
        [
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        Json(body),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct TextsQuery {
    pub language: Option<String>,
}

#[derive(Serialize)]
struct TextsResponse {
    texts: BTreeMap<String, String>,
    language: String,
}

/// GET {base}api/texts?language=xx
async fn get_texts(
    State(state): State<AppState>,
    Query(query): Query<TextsQuery>,
) -> Json<TextsResponse> {
    let language = query
        .language
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| crate::settings::BASE_LANGUAGE.to_string());
    Json(TextsResponse {
        texts: state.settings.texts_for(&language),
        language,
    })
}

/// POST {base}auth/start: заглушка авторизации Mini App.
async fn auth_start() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_index_replaces_all_placeholders() {
        let html = render_index(
            "<title>{{PROJECT_NAME}}</title><a href=\"{{BASE_PATH}}x\">{{PROJECT_NAME}}</a>",
            &[("PROJECT_NAME", "VPN"), ("BASE_PATH", "/connect/")],
        );
        assert_eq!(html, "<title>VPN</title><a href=\"/connect/x\">VPN</a>");
    }

    #[test]
    fn render_index_keeps_unknown_placeholders() {
        let html = render_index("{{VERSION}} {{OTHER}}", &[("VERSION", "1.2.3")]);
        assert_eq!(html, "1.2.3 {{OTHER}}");
    }
}
