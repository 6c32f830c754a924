//! Ссылки по странам: ключ -> группа серверов -> параллельный опрос панелей.

use crate::error::AppError;
use crate::services::panel::{ClientLinkRequest, PanelConnector, PanelError};
use crate::services::store::{self, ServerGroup, ServerRecord};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Поддерживаемый тип панели.
pub const SUPPORTED_PANEL: &str = "3x-ui";

/// Ссылка для одного сервера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryLinkResult {
    pub country: String,
    pub link: String,
    pub server_name: String,
}

/// Элемент ответа `/api/country-links`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryLink {
    pub country: String,
    pub link: String,
}

/// Почему сервер ничего не дал, без ошибки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingInbound,
    MissingApiUrl,
    InboundNotFound,
    MissingHostOrPort,
    NoClientLink,
}

/// Итог опроса одного сервера.
#[derive(Debug)]
pub enum ServerOutcome {
    Found(CountryLinkResult),
    Skipped(SkipReason),
    Failed(PanelError),
}

/// Сборщик ссылок по странам.
#[derive(Clone)]
pub struct CountryLinkAggregator {
    db: DatabaseConnection,
    panels: Arc<dyn PanelConnector>,
    supernode: bool,
    server_timeout: Duration,
}

impl CountryLinkAggregator {
    pub fn new(
        db: DatabaseConnection,
        panels: Arc<dyn PanelConnector>,
        supernode: bool,
        server_timeout: Duration,
    ) -> Self {
        Self {
            db,
            panels,
            supernode,
            server_timeout,
        }
    }

    /// Ссылки по странам для ключа, отсортированные по названию страны.
    ///
    /// Ошибка только если ключ не найден или заморожен; сбой отдельного
    /// сервера лишь исключает его из ответа.
    pub async fn country_links(&self, key_name: &str) -> Result<Vec<CountryLink>, AppError> {
        let key = store::find_active_key(&self.db, key_name)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;

        let Some(group) = resolve_group(&self.db, key.server_id.as_deref()).await? else {
            tracing::debug!("Ключ {key_name}: группа серверов не определена");
            return Ok(Vec::new());
        };

        let servers: Vec<ServerRecord> = store::find_enabled_servers(&self.db, &group)
            .await?
            .into_iter()
            .filter(|s| {
                s.panel_type
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(SUPPORTED_PANEL))
            })
            .collect();

        if servers.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = self.fan_out(key_name, servers).await;
        found.sort_by(|a, b| {
            a.country
                .cmp(&b.country)
                .then_with(|| a.server_name.cmp(&b.server_name))
        });

        Ok(found
            .into_iter()
            .map(|r| CountryLink {
                country: r.country,
                link: r.link,
            })
            .collect())
    }

    /// Опросить все серверы параллельно и дождаться каждого.
    async fn fan_out(&self, key_name: &str, servers: Vec<ServerRecord>) -> Vec<CountryLinkResult> {
        let mut tasks = JoinSet::new();

        for server in servers {
            let panels = Arc::clone(&self.panels);
            let key_name = key_name.to_string();
            let supernode = self.supernode;
            let timeout = self.server_timeout;

            tasks.spawn(async move {
                let outcome = match tokio::time::timeout(
                    timeout,
                    probe_server(panels.as_ref(), &server, &key_name, supernode),
                )
                .await
                {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => ServerOutcome::Failed(e),
                    Err(_) => ServerOutcome::Failed(PanelError::Timeout(timeout)),
                };
                (server.server_name, outcome)
            });
        }

        let mut found = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, ServerOutcome::Found(result))) => found.push(result),
                Ok((server_name, ServerOutcome::Skipped(reason))) => {
                    tracing::debug!("Сервер {server_name} пропущен: {reason:?}");
                }
                Ok((server_name, ServerOutcome::Failed(e))) => {
                    tracing::warn!("Не удалось получить ссылку для {server_name}: {e}");
                }
                Err(e) => tracing::error!("Задача опроса сервера завершилась аварийно: {e}"),
            }
        }
        found
    }
}

/// Определить группу серверов по селектору ключа.
pub async fn resolve_group(
    db: &DatabaseConnection,
    selector: Option<&str>,
) -> Result<Option<ServerGroup>, DbErr> {
    let selector = selector.map(str::trim).filter(|s| !s.is_empty());

    let base = match selector {
        Some(selector) => store::resolve_selector(db, selector).await?,
        None => None,
    };

    let mut tariff_group = base
        .as_ref()
        .and_then(|s| s.tariff_group.clone())
        .filter(|s| !s.is_empty());
    let cluster_name = base
        .as_ref()
        .and_then(|s| s.cluster_name.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| selector.map(str::to_string));

    if tariff_group.is_none() {
        if let Some(cluster) = &cluster_name {
            tariff_group = store::tariff_group_of_cluster(db, cluster).await?;
        }
    }

    Ok(match (tariff_group, cluster_name) {
        (Some(tariff), _) => Some(ServerGroup::Tariff(tariff)),
        (None, Some(cluster)) => Some(ServerGroup::Cluster(cluster)),
        (None, None) => None,
    })
}

/// Имя клиента на сервере: в режиме supernode у каждого сервера своё.
pub fn login_identity(key_name: &str, server_name: &str, supernode: bool) -> String {
    if supernode && !server_name.is_empty() {
        format!("{key_name}_{}", server_name.to_lowercase())
    } else {
        key_name.to_string()
    }
}

/// Хост без схемы, порта и пути.
pub fn extract_host(source: &str) -> Option<String> {
    let source = source.trim();
    let without_scheme = source
        .strip_prefix("https://")
        .or_else(|| source.strip_prefix("http://"))
        .unwrap_or(source);
    let host = without_scheme
        .split([':', '/'])
        .next()
        .unwrap_or_default();
    (!host.is_empty()).then(|| host.to_string())
}

async fn probe_server(
    panels: &dyn PanelConnector,
    server: &ServerRecord,
    key_name: &str,
    supernode: bool,
) -> Result<ServerOutcome, PanelError> {
    let Some(inbound_id) = server
        .inbound_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i64>().ok())
    else {
        return Ok(ServerOutcome::Skipped(SkipReason::MissingInbound));
    };
    let Some(api_url) = server.api_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        return Ok(ServerOutcome::Skipped(SkipReason::MissingApiUrl));
    };

    let login = login_identity(key_name, &server.server_name, supernode);

    let session = panels.connect(api_url).await?;
    let Some(inbound) = session.get_inbound(inbound_id).await? else {
        return Ok(ServerOutcome::Skipped(SkipReason::InboundNotFound));
    };

    let country = [inbound.remark.as_str(), server.server_name.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("Server")
        .to_string();

    let host = server
        .subscription_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .and_then(extract_host)
        .or_else(|| extract_host(api_url));
    let port = inbound.port;
    let Some(host) = host.filter(|_| port != 0) else {
        return Ok(ServerOutcome::Skipped(SkipReason::MissingHostOrPort));
    };

    let remark = format!("{country}-{key_name}");
    let request = ClientLinkRequest {
        email: &login,
        host: &host,
        port,
        remark: &remark,
    };

    Ok(match session.client_link(&inbound, &request).await? {
        Some(link) => ServerOutcome::Found(CountryLinkResult {
            country,
            link,
            server_name: server.server_name.clone(),
        }),
        None => ServerOutcome::Skipped(SkipReason::NoClientLink),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_stripped_of_scheme_port_and_path() {
        assert_eq!(
            extract_host("https://panel.example.com:2053/secret/").as_deref(),
            Some("panel.example.com")
        );
        assert_eq!(
            extract_host("http://10.0.0.5:54321").as_deref(),
            Some("10.0.0.5")
        );
        assert_eq!(
            extract_host("de.example.com").as_deref(),
            Some("de.example.com")
        );
        assert_eq!(extract_host("https://"), None);
        assert_eq!(extract_host(""), None);
    }

    #[test]
    fn supernode_gives_per_server_identity() {
        assert_eq!(login_identity("alice", "DE-1", true), "alice_de-1");
        assert_eq!(login_identity("alice", "DE-1", false), "alice");
        assert_eq!(login_identity("alice", "", true), "alice");
    }
}
