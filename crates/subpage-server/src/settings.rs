//! Настройки страницы: приложения, ссылки, темы, праздники и тексты.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Встроенные настройки по умолчанию.
pub const DEFAULT_SETTINGS: &str = include_str!("../assets/settings.toml");

/// Язык, тексты которого подставляются для неизвестных языков.
pub const BASE_LANGUAGE: &str = "ru";

/// platform -> name -> порядок показа (0 = скрыто)
pub type OrderTable = BTreeMap<String, BTreeMap<String, u32>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSettings {
    pub project_name: String,
    #[serde(default)]
    pub bot_username: String,
    #[serde(default)]
    pub support_chat: String,
    pub theme: String,
    #[serde(default)]
    pub gradient_colors: BTreeMap<String, String>,
    pub language: LanguageSettings,
    #[serde(default)]
    pub haptic_enabled: bool,
    #[serde(default)]
    pub vless_selector_enabled: bool,
    /// Отдавать крипто-ссылку Remnawave вместо обычной
    #[serde(default)]
    pub happ_cryptolink: bool,
    #[serde(default)]
    pub apps: OrderTable,
    #[serde(default)]
    pub buttons: OrderTable,
    #[serde(default)]
    pub app_links: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub deeplinks: BTreeMap<String, String>,
    pub holidays: HolidaySettings,
    #[serde(default)]
    pub texts: BTreeMap<String, TextTables>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSettings {
    pub default_mode: String,
    pub fallback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidaySettings {
    pub enabled: bool,
    #[serde(default)]
    pub user_can_disable: bool,
    #[serde(default)]
    pub list: BTreeMap<String, Holiday>,
    /// год -> [месяц, день] православной Пасхи
    #[serde(default)]
    pub easter_dates: BTreeMap<String, [u32; 2]>,
    pub easter_config: EasterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub enabled: bool,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
    pub theme: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub greeting: String,
    #[serde(default)]
    pub effects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasterConfig {
    pub enabled: bool,
    pub days_before: u32,
    pub days_after: u32,
    pub theme: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub greeting: String,
    #[serde(default)]
    pub effects: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextTables {
    #[serde(default, rename = "static")]
    pub static_texts: BTreeMap<String, String>,
    #[serde(default)]
    pub dynamic: BTreeMap<String, String>,
}

impl PageSettings {
    /// Прочитать настройки из файла или взять встроенные.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Не удалось прочитать настройки {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Некорректные настройки {}", path.display()))
            }
            None => Ok(toml::from_str(DEFAULT_SETTINGS)?),
        }
    }

    /// Все тексты языка: статические и динамические вместе.
    ///
    /// Каждая таблица берётся из базового языка отдельно, если у языка её нет.
    pub fn texts_for(&self, language: &str) -> BTreeMap<String, String> {
        let own = self.texts.get(language);
        let base = self.texts.get(BASE_LANGUAGE);
        let table = |pick: fn(&TextTables) -> &BTreeMap<String, String>| {
            own.map(pick)
                .filter(|t| !t.is_empty())
                .or_else(|| base.map(pick))
                .cloned()
                .unwrap_or_default()
        };

        let mut merged = table(|t| &t.static_texts);
        merged.extend(table(|t| &t.dynamic));
        merged
    }
}
