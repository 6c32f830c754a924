//! Отправка подписки на телевизор через Happ API.

use reqwest::{Client, StatusCode};
use serde_json::json;

/// Ответ Happ API как есть: статус и текст тела.
#[derive(Debug)]
pub struct TvRelayResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Клиент Happ `sendtv`.
#[derive(Clone)]
pub struct TvRelay {
    client: Client,
    base_url: String,
}

impl TvRelay {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// POST `{base_url}/{code}` с телом `{"data": ...}`.
    pub async fn send(
        &self,
        code: &str,
        data: &serde_json::Value,
    ) -> Result<TvRelayResponse, reqwest::Error> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(code));
        let response = self
            .client
            .post(&url)
            .json(&json!({ "data": data }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::info!("Happ sendtv: код {code}, статус {status}");

        Ok(TvRelayResponse { status, body })
    }
}
