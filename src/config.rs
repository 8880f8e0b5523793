use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PayrollError, Result};
use crate::payroll::PayrollConfig;

/// 既定の基本時給（円）
pub const DEFAULT_BASE_WAGE: f64 = 1000.0;
/// 既定の残業倍率
pub const DEFAULT_OVERTIME: f64 = 1.25;

/// 店舗ごとの計算設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub name: String,
    pub base_wage: f64,
    pub overtime: f64,
    #[serde(default, deserialize_with = "exclude_words_from_json")]
    pub exclude_words: Vec<String>,
}

impl StoreSettings {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_wage: DEFAULT_BASE_WAGE,
            overtime: DEFAULT_OVERTIME,
            exclude_words: Vec::new(),
        }
    }

    /// 計算用の設定に変換（時給の検証を含む）
    pub fn payroll_config(&self) -> Result<PayrollConfig> {
        PayrollConfig::new(self.base_wage, self.overtime, self.exclude_words.clone())
    }
}

/// "a, b,,c" → ["a", "b", "c"]
pub fn parse_exclude_words(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// JSON上の除外ワード（配列・カンマ区切り文字列・null）
#[derive(Deserialize)]
#[serde(untagged)]
enum ExcludeWordsJson {
    List(Vec<String>),
    Text(String),
    Null(()),
}

impl ExcludeWordsJson {
    /// nullは未指定扱い
    fn into_words(self) -> Option<Vec<String>> {
        match self {
            ExcludeWordsJson::List(words) => Some(
                words
                    .into_iter()
                    .map(|w| w.trim().to_string())
                    .filter(|w| !w.is_empty())
                    .collect(),
            ),
            ExcludeWordsJson::Text(text) => Some(parse_exclude_words(&text)),
            ExcludeWordsJson::Null(()) => None,
        }
    }
}

fn exclude_words_from_json<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(ExcludeWordsJson::deserialize(deserializer)?.into_words().unwrap_or_default())
}

fn optional_exclude_words<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(ExcludeWordsJson::deserialize(deserializer)?.into_words())
}

/// 店舗指定と個別指定（個別指定が優先）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOverrides {
    pub store: Option<String>,
    pub base_wage: Option<f64>,
    pub overtime: Option<f64>,
    #[serde(default, deserialize_with = "optional_exclude_words")]
    pub exclude_words: Option<Vec<String>>,
}

/// 店舗キー → 設定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StoreCatalog {
    pub stores: BTreeMap<String, StoreSettings>,
}

impl Default for StoreCatalog {
    /// 既定の5店舗（時給1000円・残業1.25倍）
    fn default() -> Self {
        let stores = [
            ("night", "夜勤"),
            ("sagamihara_higashi", "相模原東大沼店"),
            ("kobuchi", "古淵駅前店"),
            ("hashimoto", "相模原橋本五丁目店"),
            ("isehara", "伊勢原高森七丁目店"),
        ]
        .into_iter()
        .map(|(key, name)| (key.to_string(), StoreSettings::new(name)))
        .collect();
        Self { stores }
    }
}

impl StoreCatalog {
    /// JSONファイルの設定を既定値に上書きする
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let overrides: BTreeMap<String, StoreSettings> = serde_json::from_str(&text)?;
        let mut catalog = Self::default();
        info!("店舗設定を読み込みました: {} ({}件)", path.as_ref().display(), overrides.len());
        catalog.stores.extend(overrides);
        Ok(catalog)
    }

    /// 環境変数 PAYROLL_STORES_PATH があればそのファイル、なければ既定値
    pub fn from_env() -> Result<Self> {
        match env::var("PAYROLL_STORES_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn get(&self, key: &str) -> Result<&StoreSettings> {
        self.stores
            .get(key)
            .ok_or_else(|| PayrollError::UnknownStore(key.to_string()))
    }

    /// 計算設定と店舗名を決める
    ///
    /// 時給は個別指定 → 店舗設定の順。どちらもなければ `MissingRates`。
    /// 残業倍率は未指定なら既定値、除外ワードは未指定なら店舗設定のもの。
    pub fn resolve(&self, overrides: &RateOverrides) -> Result<(PayrollConfig, String)> {
        let store = self.lookup(overrides)?;
        let base_wage = overrides
            .base_wage
            .or(store.map(|s| s.base_wage))
            .ok_or(PayrollError::MissingRates)?;
        let overtime = overrides
            .overtime
            .or(store.map(|s| s.overtime))
            .unwrap_or(DEFAULT_OVERTIME);
        let (exclude_words, store_name) = Self::words_and_name(store, overrides);
        Ok((PayrollConfig::new(base_wage, overtime, exclude_words)?, store_name))
    }

    /// 除外ワードと店舗名だけを決める（出勤表用、時給は不要）
    pub fn exclude_words_and_name(&self, overrides: &RateOverrides) -> Result<(Vec<String>, String)> {
        let store = self.lookup(overrides)?;
        Ok(Self::words_and_name(store, overrides))
    }

    fn lookup(&self, overrides: &RateOverrides) -> Result<Option<&StoreSettings>> {
        overrides.store.as_deref().map(|key| self.get(key)).transpose()
    }

    fn words_and_name(store: Option<&StoreSettings>, overrides: &RateOverrides) -> (Vec<String>, String) {
        let exclude_words = match (&overrides.exclude_words, store) {
            (Some(words), _) => words.clone(),
            (None, Some(s)) => s.exclude_words.clone(),
            (None, None) => Vec::new(),
        };
        let store_name = store.map(|s| s.name.clone()).unwrap_or_default();
        (exclude_words, store_name)
    }
}

/// HTTPサーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    /// 環境変数から設定を読み込み
    /// 例: PAYROLL_PORT
    pub fn from_env() -> Self {
        Self {
            port: env::var("PAYROLL_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
        }
    }
}
