//! Точка входа страницы подключения.

use clap::Parser;
use std::time::Duration;
use subpage_server::config::{
    normalize_base_path, PanelCredentials, RateLimitConfig, ServerConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "subpage-server",
    about = "Страница подключения: подписка и VLESS-ссылки по странам"
)]
struct Cli {
    /// Адрес для прослушивания (host:port)
    #[arg(long, default_value = "0.0.0.0:3023", env = "SUBPAGE_LISTEN")]
    listen: String,

    /// URL общей базы данных бота
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Создать таблицы, если их нет
    #[arg(long)]
    migrate: bool,

    /// Префикс маршрутов
    #[arg(long, default_value = "/connect/", env = "SUBPAGE_BASE_PATH")]
    base_path: String,

    /// Домен бота
    #[arg(long, env = "WEBHOOK_HOST")]
    webhook_host: String,

    /// Отдельный домен webapp
    #[arg(long, env = "WEBAPP_DOMAIN")]
    webapp_domain: Option<String>,

    /// CDN-домен для кнопок
    #[arg(long, env = "CDN_DOMAIN")]
    cdn_domain: Option<String>,

    /// Логин панелей 3x-ui
    #[arg(long, env = "XUI_USERNAME")]
    panel_username: String,

    /// Пароль панелей 3x-ui
    #[arg(long, env = "XUI_PASSWORD")]
    panel_password: String,

    /// Отдельный логин клиента на каждом сервере
    #[arg(long, env = "SUPERNODE")]
    supernode: bool,

    /// Ожидание ответа одного сервера, сек
    #[arg(long, default_value_t = 10)]
    server_timeout_secs: u64,

    /// Отключить ограничение запросов по IP
    #[arg(long)]
    no_rate_limit: bool,

    /// Запросов за период с одного IP
    #[arg(long, default_value_t = 20)]
    rate_limit_requests: usize,

    /// Период подсчёта запросов, сек
    #[arg(long, default_value_t = 60)]
    rate_limit_period_secs: u64,

    /// Время блокировки IP, сек
    #[arg(long, default_value_t = 60)]
    rate_limit_block_secs: u64,

    /// Каталог с VERSION и static/
    #[arg(long, default_value = ".", env = "SUBPAGE_WEB_ROOT")]
    web_root: String,

    /// TOML с настройками страницы
    #[arg(long, env = "SUBPAGE_SETTINGS")]
    settings: Option<String>,

    /// Адрес Happ API для TV
    #[arg(long, default_value = "https://check.happ.su/sendtv")]
    happ_tv_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логгера
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = ServerConfig {
        listen: cli.listen,
        db_url: cli.db_url,
        migrate: cli.migrate,
        base_path: normalize_base_path(&cli.base_path),
        webhook_host: cli.webhook_host,
        webapp_domain: cli.webapp_domain,
        cdn_domain: cli.cdn_domain,
        panel: PanelCredentials {
            username: cli.panel_username,
            password: cli.panel_password,
        },
        supernode: cli.supernode,
        server_timeout: Duration::from_secs(cli.server_timeout_secs),
        rate_limit: RateLimitConfig {
            enabled: !cli.no_rate_limit,
            max_requests: cli.rate_limit_requests,
            period: Duration::from_secs(cli.rate_limit_period_secs),
            block_time: Duration::from_secs(cli.rate_limit_block_secs),
        },
        web_root: cli.web_root,
        settings_path: cli.settings,
        happ_tv_url: cli.happ_tv_url,
    };

    subpage_server::run(config).await
}
