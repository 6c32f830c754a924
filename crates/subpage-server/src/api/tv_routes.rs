//! Маршрут отправки подписки на TV.

use crate::api::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct TvRequest {
    pub code: Option<String>,
    #[serde(default)]
    pub data: Value,
}

pub fn routes(base: &str) -> Router<AppState> {
    Router::new().route(&format!("{base}api/tv"), post(send_to_tv))
}

/// POST {base}api/tv: переслать подписку в Happ по коду с экрана TV.
async fn send_to_tv(
    State(state): State<AppState>,
    body: Result<Json<TvRequest>, JsonRejection>,
) -> Response {
    let request = body.ok().map(|Json(req)| req);
    let (code, data) = match request {
        Some(TvRequest {
            code: Some(code),
            data,
        }) if !code.is_empty() && !is_empty_value(&data) => (code, data),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": "Missing code or data parameter" })),
            )
                .into_response()
        }
    };

    match state.tv_relay.send(&code, &data).await {
        Ok(reply) if reply.status == StatusCode::OK => Json(json!({
            "success": true,
            "message": "Subscription sent successfully",
            "response": reply.body
        }))
        .into_response(),
        Ok(reply) => (
            reply.status,
            Json(json!({
                "success": false,
                "error": format!("Happ API error: {}", reply.status.as_u16()),
                "response": reply.body
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Ошибка отправки в Happ API: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Пустые и ложные значения считаются отсутствующими.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_data_counts_as_missing() {
        for value in [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!([]),
            json!({}),
        ] {
            assert!(is_empty_value(&value), "{value} должно считаться пустым");
        }
        for value in [json!("happ://x"), json!(1), json!(true), json!(["a"]), json!({"a": 1})] {
            assert!(!is_empty_value(&value), "{value} не пустое");
        }
    }
}
