//! Клиент панели 3x-ui: вход, чтение inbound, выпуск ссылки клиента.

use crate::services::vless;
use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("ошибка HTTP: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("панель ответила статусом {0}")]
    Status(reqwest::StatusCode),

    #[error("панель отклонила вход: {0}")]
    LoginRejected(String),

    #[error("некорректный ответ панели: {0}")]
    Malformed(String),

    #[error("панель не ответила за {0:?}")]
    Timeout(Duration),
}

/// Inbound панели: порт, подпись и JSON-настройки.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    pub id: i64,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub protocol: String,
    /// JSON-текст со списком клиентов
    #[serde(default)]
    pub settings: String,
    /// JSON-текст с транспортом и безопасностью
    #[serde(default)]
    pub stream_settings: String,
}

/// Параметры ссылки, выпускаемой для клиента.
#[derive(Debug, Clone)]
pub struct ClientLinkRequest<'a> {
    pub email: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub remark: &'a str,
}

/// Подключение к панели конкретного сервера.
#[async_trait]
pub trait PanelSession: Send + Sync {
    async fn get_inbound(&self, inbound_id: i64) -> Result<Option<Inbound>, PanelError>;

    async fn client_link(
        &self,
        inbound: &Inbound,
        request: &ClientLinkRequest<'_>,
    ) -> Result<Option<String>, PanelError>;
}

/// Фабрика подключений по адресу API панели.
#[async_trait]
pub trait PanelConnector: Send + Sync {
    async fn connect(&self, api_url: &str) -> Result<Arc<dyn PanelSession>, PanelError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    msg: String,
    obj: Option<T>,
}

/// Подключения к 3x-ui с общими учётными данными.
#[derive(Clone)]
pub struct XuiConnector {
    client: Client,
    username: String,
    password: String,
}

impl XuiConnector {
    pub fn new(username: String, password: String, timeout: Duration) -> Result<Self, PanelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            username,
            password,
        })
    }
}

#[async_trait]
impl PanelConnector for XuiConnector {
    async fn connect(&self, api_url: &str) -> Result<Arc<dyn PanelSession>, PanelError> {
        let base_url = api_url.trim_end_matches('/').to_string();
        let response = self
            .client
            .post(format!("{base_url}/login"))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PanelError::Status(response.status()));
        }

        // Сессия панели живёт в cookie, передаём её явно в каждом запросе
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("; ");

        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if !body.success {
            return Err(PanelError::LoginRejected(body.msg));
        }
        if cookie.is_empty() {
            return Err(PanelError::Malformed("панель не выдала cookie сессии".into()));
        }

        tracing::debug!("Вход в панель {base_url} выполнен");
        Ok(Arc::new(XuiSession {
            client: self.client.clone(),
            base_url,
            cookie,
        }))
    }
}

struct XuiSession {
    client: Client,
    base_url: String,
    cookie: String,
}

#[async_trait]
impl PanelSession for XuiSession {
    async fn get_inbound(&self, inbound_id: i64) -> Result<Option<Inbound>, PanelError> {
        let response = self
            .client
            .get(format!(
                "{}/panel/api/inbounds/get/{inbound_id}",
                self.base_url
            ))
            .header(COOKIE, &self.cookie)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PanelError::Status(response.status()));
        }

        let body: ApiResponse<Inbound> = response.json().await?;
        if !body.success {
            // 3x-ui отвечает success=false и для несуществующего inbound
            tracing::debug!(
                "Панель {} не вернула inbound {inbound_id}: {}",
                self.base_url,
                body.msg
            );
            return Ok(None);
        }
        Ok(body.obj)
    }

    async fn client_link(
        &self,
        inbound: &Inbound,
        request: &ClientLinkRequest<'_>,
    ) -> Result<Option<String>, PanelError> {
        vless::build_client_link(inbound, request)
    }
}
