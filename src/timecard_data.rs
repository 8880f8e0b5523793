use serde::{Deserialize, Serialize};

use crate::cell_value::CellValue;
use crate::shift_cell::ShiftCell;
use crate::wage::{calculate_salary_from_breakdown, HoursBreakdown, PayRates};

/// 1日の通常勤務の上限（これを超えた分が残業）
pub const REGULAR_HOURS_PER_DAY: f64 = 8.0;

/// 休憩控除ルール（勤務時間が `min_hours` 以上なら `deduct` 時間を引く）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakRule {
    pub min_hours: f64,
    pub deduct: f64,
}

/// 閾値の高い順。最初に当てはまった1つだけ適用する
pub const BREAK_DEDUCTIONS: [BreakRule; 3] = [
    BreakRule { min_hours: 8.0, deduct: 1.0 },
    BreakRule { min_hours: 7.0, deduct: 0.75 },
    BreakRule { min_hours: 6.0, deduct: 0.5 },
];

/// 休憩控除後の勤務時間（0未満にはしない）
pub fn apply_break_deduction(day_hours: f64) -> f64 {
    match BREAK_DEDUCTIONS.iter().find(|rule| day_hours >= rule.min_hours) {
        Some(rule) => (day_hours - rule.deduct).max(0.0),
        None => day_hours,
    }
}

/// 控除後の1日分を通常・残業に分ける
pub fn split_day(net_hours: f64) -> HoursBreakdown {
    HoursBreakdown {
        regular_hours: net_hours.min(REGULAR_HOURS_PER_DAY),
        overtime_hours: (net_hours - REGULAR_HOURS_PER_DAY).max(0.0),
    }
}

/// 従業員1人分のシフト表（期間の日順に並んだセル）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeSchedule {
    pub cells: Vec<CellValue>,
}

impl EmployeeSchedule {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 日別データから集計を計算
    pub fn calculate(&self, rates: &PayRates) -> EmployeeSummary {
        calculate_employee(&self.cells, rates)
    }
}

impl From<Vec<CellValue>> for EmployeeSchedule {
    fn from(cells: Vec<CellValue>) -> Self {
        Self::new(cells)
    }
}

/// 従業員1人分の集計
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    /// 休憩控除後の勤務時間合計
    pub hours: f64,
    /// 出勤日数
    pub days: u32,
    /// 欠勤日数
    pub absent_days: u32,
    pub salary: i64,
    pub breakdown: HoursBreakdown,
}

impl EmployeeSummary {
    pub fn regular_hours(&self) -> f64 {
        self.breakdown.regular_hours
    }

    pub fn overtime_hours(&self) -> f64 {
        self.breakdown.overtime_hours
    }
}

/// シフト表・時給・残業倍率から1人分を計算
pub fn calculate_employee(schedule: &[CellValue], rates: &PayRates) -> EmployeeSummary {
    let mut summary = EmployeeSummary::default();

    for shift in schedule.iter().map(ShiftCell::parse) {
        match &shift {
            ShiftCell::Empty => continue,
            ShiftCell::Absence => {
                summary.absent_days += 1;
                continue;
            }
            ShiftCell::Segments(_) if !shift.is_workday() => continue,
            ShiftCell::Segments(_) => {}
        }

        summary.days += 1;
        let net_hours = apply_break_deduction(shift.day_hours());
        summary.hours += net_hours;

        let day = split_day(net_hours);
        summary.breakdown.regular_hours += day.regular_hours;
        summary.breakdown.overtime_hours += day.overtime_hours;
    }

    summary.salary = calculate_salary_from_breakdown(Some(&summary.breakdown), rates);
    summary
}
