use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell_value::CellValue;
use crate::error::Result;
use crate::timecard_data::EmployeeSchedule;
use crate::wage::{HoursBreakdown, PayRates};

/// 従業員名が並ぶ行
pub const HEADER_ROW: usize = 2;
/// 従業員名の最初の列（0〜2列目は日付・曜日などのメタデータ）
pub const FIRST_EMPLOYEE_COLUMN: usize = 3;
/// 期間1日目のシフト行
pub const FIRST_DAY_ROW: usize = 3;
/// 1期間の日数（行3〜33）
pub const DAYS_PER_PERIOD: usize = 31;

/// 読み込み済みのシート（行 × セル）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetTable {
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// 範囲外は空セル
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定列の期間分のシフト（足りない行は空セル）
    pub fn schedule_for_column(&self, col: usize) -> EmployeeSchedule {
        (FIRST_DAY_ROW..FIRST_DAY_ROW + DAYS_PER_PERIOD)
            .map(|row| self.cell(row, col).clone())
            .collect::<Vec<_>>()
            .into()
    }

    /// ヘッダー行から対象従業員の (列, 名前) を左から順に取り出す
    pub fn employee_columns(&self, exclude_words: &[String]) -> Vec<(usize, String)> {
        self.row(HEADER_ROW)
            .iter()
            .enumerate()
            .skip(FIRST_EMPLOYEE_COLUMN)
            .filter_map(|(col, cell)| employee_name(cell).map(|name| (col, name)))
            .filter(|(_, name)| !is_excluded(name, exclude_words))
            .collect()
    }
}

/// 名前セルの文字列（空・0は対象外。文字列はtrimせずそのまま名前にする）
fn employee_name(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        CellValue::Text(s) if s.is_empty() => None,
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Number(n) if *n == 0.0 || n.is_nan() => None,
        CellValue::Number(_) => Some(cell.normalized()),
    }
}

/// 除外ワードを含む名前か（大文字小文字を区別する部分一致）
pub fn is_excluded(name: &str, exclude_words: &[String]) -> bool {
    exclude_words.iter().any(|word| name.contains(word.as_str()))
}

/// 給与計算の設定
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollConfig {
    pub rates: PayRates,
    pub exclude_words: Vec<String>,
}

impl PayrollConfig {
    pub fn new(base_wage: f64, overtime: f64, exclude_words: Vec<String>) -> Result<Self> {
        Ok(Self {
            rates: PayRates::new(base_wage, overtime)?,
            exclude_words,
        })
    }
}

/// 従業員1人分の計算結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResult {
    pub name: String,
    pub base_wage: f64,
    pub hours: f64,
    pub days: u32,
    pub absent_days: u32,
    pub base_salary: i64,
    /// 交通費（この計算では常に0）
    pub transport: i64,
    pub salary: i64,
    pub breakdown: HoursBreakdown,
    pub regular_hours: f64,
    pub overtime_hours: f64,
}

/// シート1枚分の計算結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResult {
    pub results: Vec<EmployeeResult>,
    pub total_salary: i64,
    /// `results` と同じ順のシフト表（明細・再計算用）
    #[serde(skip)]
    pub schedules: Vec<EmployeeSchedule>,
}

/// シート全体の給与を計算
pub fn calculate_payroll(table: &SheetTable, config: &PayrollConfig) -> PayrollResult {
    let mut payroll = PayrollResult::default();

    for (col, name) in table.employee_columns(&config.exclude_words) {
        let schedule = table.schedule_for_column(col);
        let summary = schedule.calculate(&config.rates);
        debug!(
            "{}: {}日 {}時間 欠勤{}日 {}円",
            name, summary.days, summary.hours, summary.absent_days, summary.salary
        );

        payroll.results.push(EmployeeResult {
            name,
            base_wage: config.rates.base_wage,
            hours: summary.hours,
            days: summary.days,
            absent_days: summary.absent_days,
            base_salary: summary.salary,
            transport: 0,
            salary: summary.salary,
            breakdown: summary.breakdown,
            regular_hours: summary.regular_hours(),
            overtime_hours: summary.overtime_hours(),
        });
        payroll.schedules.push(schedule);
    }

    payroll.total_salary = payroll.results.iter().map(|r| r.salary).sum();
    payroll
}
