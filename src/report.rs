use serde::Serialize;

use crate::payroll::PayrollResult;

/// 店舗・期間ごとの月次サマリー
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    /// 総労働時間
    pub total_hours: f64,
    /// 残業時間
    pub overtime_hours: f64,
    /// 概算給与
    pub total_salary: i64,
    /// 出勤日数（延べ）
    pub workdays: u32,
}

impl StoreSummary {
    pub fn from_payroll(payroll: &PayrollResult) -> Self {
        payroll.results.iter().fold(Self::default(), |acc, r| Self {
            total_hours: acc.total_hours + r.hours,
            overtime_hours: acc.overtime_hours + r.overtime_hours,
            total_salary: acc.total_salary + r.salary,
            workdays: acc.workdays + r.days,
        })
    }
}
