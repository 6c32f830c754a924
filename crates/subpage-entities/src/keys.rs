//! Entity для таблицы keys.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keys")]
pub struct Model {
    /// Идентификатор клиента в панели
    #[sea_orm(primary_key, auto_increment = false)]
    pub client_id: String,

    /// Имя ключа (email клиента), по нему ищет страница подключения
    #[sea_orm(unique)]
    pub email: String,

    /// Селектор группы серверов: кластер, имя сервера или тарифная группа
    pub server_id: Option<String>,

    /// Замороженные ключи не видны странице
    pub is_frozen: bool,

    /// Окончание подписки, миллисекунды UNIX
    pub expiry_time: i64,

    /// Исходная ссылка подписки
    pub key: Option<String>,

    /// Альтернативная (крипто) ссылка Remnawave
    pub remnawave_link: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
