//! Ядро страницы подключения xui_subpage.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod settings;


use anyhow::Context;
use api::rate_limit::RateLimiter;
use api::AppState;
use config::ServerConfig;
use sea_orm::{Database, DatabaseConnection};
use services::country_links::CountryLinkAggregator;
use services::panel::XuiConnector;
use services::tv_service::TvRelay;
use settings::PageSettings;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use subpage_migration::{Migrator, MigratorTrait};
use tokio::sync::watch;
use tracing::info;

const TV_RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Запустить страницу подключения.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    // 1. Подключение к БД
    info!("Подключение к базе данных");
    let db: DatabaseConnection = Database::connect(&config.db_url).await?;

    // 2. Миграции только для автономной установки, схемой владеет бот
    if config.migrate {
        info!("Выполнение миграций...");
        Migrator::up(&db, None).await?;
    }

    // 3. Настройки страницы
    let settings = PageSettings::load(config.settings_path.as_deref().map(Path::new))?;
    info!("Настройки страницы загружены: {}", settings.project_name);

    // 4. Клиенты внешних API
    let connector = XuiConnector::new(
        config.panel.username.clone(),
        config.panel.password.clone(),
        config.server_timeout,
    )
    .context("Не удалось создать HTTP-клиент панели")?;
    let tv_client = reqwest::Client::builder()
        .timeout(TV_RELAY_TIMEOUT)
        .build()
        .context("Не удалось создать HTTP-клиент Happ")?;

    // 5. Состояние приложения
    let state = AppState {
        db: db.clone(),
        country_links: CountryLinkAggregator::new(
            db,
            Arc::new(connector),
            config.supernode,
            config.server_timeout,
        ),
        tv_relay: TvRelay::new(tv_client, config.happ_tv_url.clone()),
        rate_limiter: RateLimiter::new(config.rate_limit.clone()),
        settings: Arc::new(settings),
        config: Arc::new(config.clone()),
    };

    // 6. Маршрутизатор
    let app = api::build_router(state);

    // 7. Graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Получен сигнал завершения, останавливаю сервер...");
        let _ = shutdown_tx.send(true);
    });

    // 8. Запуск сервера
    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Не удалось занять адрес {}", config.listen))?;
    info!(
        "Страница подключения запущена на {}{}",
        config.listen, config.base_path
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    })
    .await?;

    info!("Страница подключения остановлена");
    Ok(())
}
