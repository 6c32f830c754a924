//! Чтение ключей и серверов из общей БД бота.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use subpage_entities::keys::{self, Entity as KeyEntity};
use subpage_entities::servers::{self, Entity as ServerEntity};

pub type KeyRecord = keys::Model;
pub type ServerRecord = servers::Model;

/// Стратегия поиска сервера по селектору ключа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLookup {
    ClusterName,
    ServerName,
    TariffGroup,
}

/// Порядок, в котором селектор ключа сопоставляется с серверами.
pub const SELECTOR_CHAIN: [ServerLookup; 3] = [
    ServerLookup::ClusterName,
    ServerLookup::ServerName,
    ServerLookup::TariffGroup,
];

impl ServerLookup {
    fn column(self) -> servers::Column {
        match self {
            ServerLookup::ClusterName => servers::Column::ClusterName,
            ServerLookup::ServerName => servers::Column::ServerName,
            ServerLookup::TariffGroup => servers::Column::TariffGroup,
        }
    }
}

/// Группа, по которой выбираются серверы ключа.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerGroup {
    Tariff(String),
    Cluster(String),
}

/// Найти незамороженный ключ по имени (email).
pub async fn find_active_key(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<KeyRecord>, DbErr> {
    KeyEntity::find()
        .filter(keys::Column::Email.eq(name))
        .filter(keys::Column::IsFrozen.eq(false))
        .one(db)
        .await
}

/// Найти первый сервер, у которого поле стратегии равно селектору.
pub async fn find_server(
    db: &DatabaseConnection,
    lookup: ServerLookup,
    selector: &str,
) -> Result<Option<ServerRecord>, DbErr> {
    ServerEntity::find()
        .filter(lookup.column().eq(selector))
        .order_by_asc(servers::Column::Id)
        .one(db)
        .await
}

/// Пройти цепочку стратегий, пока одна из них не найдёт сервер.
pub async fn resolve_selector(
    db: &DatabaseConnection,
    selector: &str,
) -> Result<Option<ServerRecord>, DbErr> {
    for lookup in SELECTOR_CHAIN {
        if let Some(server) = find_server(db, lookup, selector).await? {
            tracing::debug!("Селектор {selector} сопоставлен через {lookup:?}");
            return Ok(Some(server));
        }
    }
    Ok(None)
}

/// Тарифная группа любого сервера кластера.
pub async fn tariff_group_of_cluster(
    db: &DatabaseConnection,
    cluster_name: &str,
) -> Result<Option<String>, DbErr> {
    let server = ServerEntity::find()
        .filter(servers::Column::ClusterName.eq(cluster_name))
        .filter(servers::Column::TariffGroup.is_not_null())
        .filter(servers::Column::TariffGroup.ne(""))
        .order_by_asc(servers::Column::Id)
        .one(db)
        .await?;
    Ok(server.and_then(|s| s.tariff_group))
}

/// Включённые серверы группы.
pub async fn find_enabled_servers(
    db: &DatabaseConnection,
    group: &ServerGroup,
) -> Result<Vec<ServerRecord>, DbErr> {
    let (column, name) = match group {
        ServerGroup::Tariff(name) => (servers::Column::TariffGroup, name),
        ServerGroup::Cluster(name) => (servers::Column::ClusterName, name),
    };

    ServerEntity::find()
        .filter(servers::Column::Enabled.eq(true))
        .filter(column.eq(name.as_str()))
        .order_by_asc(servers::Column::Id)
        .all(db)
        .await
}

/// Проверка доступности БД для /health.
pub async fn ping(db: &DatabaseConnection) -> bool {
    db.execute_unprepared("SELECT 1").await.is_ok()
}
