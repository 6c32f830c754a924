//! Entity для таблицы servers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "servers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Отображаемое имя сервера (например "DE-1")
    pub server_name: String,

    /// Имя кластера
    pub cluster_name: Option<String>,

    /// Тарифная группа
    pub tariff_group: Option<String>,

    /// Тип панели: "3x-ui", "remnawave", ...
    pub panel_type: Option<String>,

    /// Включён ли сервер
    pub enabled: bool,

    /// URL API панели
    pub api_url: Option<String>,

    /// URL подписки (хост для ссылок)
    pub subscription_url: Option<String>,

    /// Идентификатор inbound в панели (хранится текстом)
    pub inbound_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
