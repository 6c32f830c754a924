//! Миграции таблиц keys и servers.
//!
//! Схемой владеет бот; миграции нужны для тестов и автономной установки.

pub use sea_orm_migration::prelude::*;

mod m001_create_keys_and_servers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m001_create_keys_and_servers::Migration)]
    }
}
