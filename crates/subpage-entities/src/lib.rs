//! Entity-модели общей базы бота: ключи и серверы.

pub mod keys;
pub mod servers;
