//! Данные подписки для страницы: основная ссылка и срок действия.

use crate::error::AppError;
use crate::services::store::{self, KeyRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionInfo {
    pub key: Option<String>,
    pub expiry: String,
    pub link: Option<String>,
    pub email: String,
    pub is_crypto_link: bool,
    pub remnawave_link: Option<String>,
}

/// Получить подписку по имени ключа.
pub async fn get_subscription(
    db: &DatabaseConnection,
    key_name: &str,
    happ_cryptolink: bool,
) -> Result<SubscriptionInfo, AppError> {
    let key = store::find_active_key(db, key_name)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;
    subscription_info(key, happ_cryptolink)
}

pub(crate) fn subscription_info(
    key: KeyRecord,
    happ_cryptolink: bool,
) -> Result<SubscriptionInfo, AppError> {
    let expiry = DateTime::<Utc>::from_timestamp_millis(key.expiry_time).ok_or_else(|| {
        AppError::Internal(format!(
            "некорректный expiry_time {} у ключа {}",
            key.expiry_time, key.email
        ))
    })?;

    let remnawave_link = key.remnawave_link.filter(|l| !l.is_empty());
    let raw_key = key.key.filter(|l| !l.is_empty());

    let (link, is_crypto_link) = match (&remnawave_link, happ_cryptolink) {
        (Some(crypto), true) => (Some(crypto.clone()), true),
        _ => (raw_key.clone().or_else(|| remnawave_link.clone()), false),
    };

    Ok(SubscriptionInfo {
        key: raw_key,
        expiry: isoformat(&expiry),
        link,
        email: key.email,
        is_crypto_link,
        remnawave_link: remnawave_link.filter(|_| happ_cryptolink),
    })
}

/// Дробная часть только для нецелых секунд, в микросекундах.
fn isoformat(moment: &DateTime<Utc>) -> String {
    let format = if moment.timestamp_subsec_nanos() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    moment.to_rfc3339_opts(format, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: Option<&str>, crypto: Option<&str>) -> KeyRecord {
        KeyRecord {
            client_id: "c1".into(),
            email: "alice".into(),
            server_id: Some("eu-cluster".into()),
            is_frozen: false,
            expiry_time: 1_767_225_600_000,
            key: raw.map(str::to_string),
            remnawave_link: crypto.map(str::to_string),
        }
    }

    #[test]
    fn expiry_is_rendered_as_utc_timestamp() {
        let info = subscription_info(key(Some("https://sub/alice"), None), false).unwrap();
        assert_eq!(info.expiry, "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn expiry_keeps_milliseconds() {
        let mut record = key(Some("https://sub/alice"), None);
        record.expiry_time = 1_767_225_600_250;
        let info = subscription_info(record, false).unwrap();
        assert_eq!(info.expiry, "2026-01-01T00:00:00.250000+00:00");
    }

    #[test]
    fn crypto_link_wins_only_when_enabled() {
        let info = subscription_info(key(Some("https://sub/alice"), Some("happ://crypt/x")), true)
            .unwrap();
        assert_eq!(info.link.as_deref(), Some("happ://crypt/x"));
        assert!(info.is_crypto_link);
        assert_eq!(info.remnawave_link.as_deref(), Some("happ://crypt/x"));

        let info =
            subscription_info(key(Some("https://sub/alice"), Some("happ://crypt/x")), false)
                .unwrap();
        assert_eq!(info.link.as_deref(), Some("https://sub/alice"));
        assert!(!info.is_crypto_link);
        assert_eq!(info.remnawave_link, None);
    }

    #[test]
    fn remnawave_link_is_used_when_key_is_empty() {
        let info = subscription_info(key(Some(""), Some("https://rw/alice")), false).unwrap();
        assert_eq!(info.link.as_deref(), Some("https://rw/alice"));
        assert!(!info.is_crypto_link);
    }
}
