use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{PayrollError, Result};

/// 時給と残業倍率
///
/// `new()` を通した値のみ計算に渡す（基本時給は有限かつ0以上）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRates {
    pub base_wage: f64,
    pub overtime_rate: f64,
}

impl PayRates {
    /// 残業倍率が数値でなければ1倍にする。基本時給の不正値はエラー
    pub fn new(base_wage: f64, overtime_rate: f64) -> Result<Self> {
        if !base_wage.is_finite() || base_wage < 0.0 {
            return Err(PayrollError::InvalidBaseWage(base_wage));
        }
        let overtime_rate = if overtime_rate.is_finite() {
            overtime_rate
        } else {
            warn!("残業倍率 {} は数値ではないため1倍で計算します", overtime_rate);
            1.0
        };
        if overtime_rate < 0.0 {
            return Err(PayrollError::InvalidOvertimeRate(overtime_rate));
        }
        Ok(Self { base_wage, overtime_rate })
    }

    /// 同じ残業倍率で時給だけ差し替える
    pub fn with_base_wage(&self, base_wage: f64) -> Result<Self> {
        Self::new(base_wage, self.overtime_rate)
    }
}

/// 通常時間・残業時間の内訳
///
/// 旧形式のキー（`regular` / `overtime`）も読み込める。
/// 新キーが優先、どちらもなければ0、数値化できなければ0。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawBreakdown")]
pub struct HoursBreakdown {
    pub regular_hours: f64,
    pub overtime_hours: f64,
}

/// 受け取ったままの内訳JSON
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBreakdown {
    regular_hours: Option<Value>,
    regular: Option<Value>,
    overtime_hours: Option<Value>,
    overtime: Option<Value>,
}

impl From<RawBreakdown> for HoursBreakdown {
    fn from(raw: RawBreakdown) -> Self {
        let pick = |primary: Option<Value>, legacy: Option<Value>| {
            // nullは未指定と同じ扱い
            let value = primary
                .filter(|v| !v.is_null())
                .or(legacy.filter(|v| !v.is_null()));
            let n = value.as_ref().map_or(0.0, lenient_number);
            if n.is_finite() {
                n
            } else {
                0.0
            }
        };
        HoursBreakdown {
            regular_hours: pick(raw.regular_hours, raw.regular),
            overtime_hours: pick(raw.overtime_hours, raw.overtime),
        }
    }
}

/// 数値・数値文字列・真偽値を数値化（変換できなければNaN）
fn lenient_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// 内訳から給与を計算（円未満切り捨て）
///
/// 内訳がなければ0円。
pub fn calculate_salary_from_breakdown(breakdown: Option<&HoursBreakdown>, rates: &PayRates) -> i64 {
    let Some(breakdown) = breakdown else {
        return 0;
    };
    let regular = finite_or_zero(breakdown.regular_hours);
    let overtime = finite_or_zero(breakdown.overtime_hours);
    let amount = regular * rates.base_wage + overtime * rates.base_wage * rates.overtime_rate;
    amount.floor() as i64
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}
