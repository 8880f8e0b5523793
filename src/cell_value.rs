use serde::{Deserialize, Serialize};
use serde_json::Value;

/// シートの1セル（文字列・数値・空）
///
/// JSONからは `null` / 文字列 / 数値 をそのまま受け取る。真偽値は文字列扱い。
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(from = "Value", into = "Value")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// 文字列化してtrimした値（空セルは空文字）
    pub fn normalized(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// 空セル、または空白のみ
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 先頭の整数部分を読む（"2024年" → 2024）
    pub fn leading_int(&self) -> Option<i32> {
        match self {
            CellValue::Number(n) => {
                let n = n.trunc();
                (n.is_finite() && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX)).then(|| n as i32)
            }
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let s = s.trim_start();
                let (sign, rest) = match s.strip_prefix('-') {
                    Some(rest) => (-1, rest),
                    None => (1, s.strip_prefix('+').unwrap_or(s)),
                };
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<i32>().ok().map(|n| sign * n)
            }
        }
    }
}

/// 数値の文字列化（整数値は小数点なし）
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::String(s) => CellValue::Text(s),
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            // 配列・オブジェクトはセル値として扱わない
            Value::Array(_) | Value::Object(_) => CellValue::Empty,
        }
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Empty => Value::Null,
            CellValue::Text(s) => Value::String(s),
            CellValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}
