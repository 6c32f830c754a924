//! Конфигурация страницы подключения.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Адрес для прослушивания (например "0.0.0.0:3023")
    pub listen: String,

    /// URL подключения к общей БД бота (postgres или sqlite)
    pub db_url: String,

    /// Применить миграции при старте (только для автономной установки)
    pub migrate: bool,

    /// Префикс всех маршрутов, всегда оканчивается на "/"
    pub base_path: String,

    /// Домен бота (WEBHOOK_HOST)
    pub webhook_host: String,

    /// Отдельный домен для webapp, если задан
    pub webapp_domain: Option<String>,

    /// CDN-домен для кнопок, если задан
    pub cdn_domain: Option<String>,

    /// Учётные данные панелей 3x-ui
    pub panel: PanelCredentials,

    /// Режим supernode: отдельный логин клиента на каждом сервере
    pub supernode: bool,

    /// Ограничение на ответ одного сервера при сборе ссылок по странам
    pub server_timeout: Duration,

    pub rate_limit: RateLimitConfig,

    /// Каталог модуля: VERSION и static/ с index.html
    pub web_root: String,

    /// Путь к TOML с настройками страницы; без него используются встроенные
    pub settings_path: Option<String>,

    /// Адрес Happ API для отправки подписки на TV
    pub happ_tv_url: String,
}

#[derive(Debug, Clone)]
pub struct PanelCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: usize,
    pub period: Duration,
    pub block_time: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 20,
            period: Duration::from_secs(60),
            block_time: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Домен, на котором реально работает backend.
    pub fn backend_domain(&self) -> &str {
        non_empty(self.webapp_domain.as_deref()).unwrap_or(&self.webhook_host)
    }

    /// Домен, на который ведут кнопки (CDN, если настроен).
    pub fn button_domain(&self) -> &str {
        non_empty(self.cdn_domain.as_deref()).unwrap_or_else(|| self.backend_domain())
    }

    /// Источники, разрешённые для CORS.
    pub fn allowed_origins(&self) -> Vec<String> {
        let backend = self.backend_domain().to_string();
        let mut origins = vec![backend.clone()];
        if let Some(cdn) = non_empty(self.cdn_domain.as_deref()) {
            if cdn != backend {
                origins.push(cdn.to_string());
            }
        }
        origins
    }
}

/// Привести префикс маршрутов к виду "/path/".
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut out = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('/') {
        out.push('/');
    }
    out.push_str(trimmed);
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
