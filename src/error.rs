use thiserror::Error;

/// 給与計算のエラー
///
/// 計算本体（セル解析・集計）はエラーを返さない。設定値の検証と入出力のみで使う。
#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("基本時給が不正です: {0}")]
    InvalidBaseWage(f64),
    #[error("残業倍率が不正です: {0}")]
    InvalidOvertimeRate(f64),
    #[error("店舗が見つかりません: {0}")]
    UnknownStore(String),
    #[error("時給が指定されていません（店舗またはbaseWageを指定してください）")]
    MissingRates,
    #[error("ファイル入出力エラー: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON変換エラー: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PayrollError>;
