use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::cell_value::CellValue;
use crate::error::Result;
use crate::payroll::{calculate_payroll, PayrollConfig, PayrollResult, SheetTable};
use crate::period::{merged_period_label, sheet_store_name, SheetPeriod};
use crate::timecard_data::{calculate_employee, EmployeeSchedule};
use crate::wage::PayRates;

/// シート1枚分の計算結果と、そのシートの期間・店舗名
#[derive(Debug, Clone)]
pub struct SheetPayroll {
    pub payroll: PayrollResult,
    pub period: Option<SheetPeriod>,
    pub store_name: String,
}

impl SheetPayroll {
    /// シートを計算する。店舗名はシート記載を優先し、なければ `fallback_store_name`
    pub fn from_table(table: &SheetTable, config: &PayrollConfig, fallback_store_name: &str) -> Self {
        Self {
            payroll: calculate_payroll(table, config),
            period: SheetPeriod::from_table(table),
            store_name: sheet_store_name(table).unwrap_or_else(|| fallback_store_name.trim().to_string()),
        }
    }
}

/// シートの期間と、その期間のシフト
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBlock {
    #[serde(flatten)]
    pub period: SheetPeriod,
    pub schedule: EmployeeSchedule,
    pub store_name: String,
}

/// 複数シートを名前でまとめた従業員1人分
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedEmployee {
    pub name: String,
    pub base_wage: f64,
    pub hours: f64,
    pub days: u32,
    pub absent_days: u32,
    pub overtime_hours: f64,
    pub base_salary: i64,
    pub transport: i64,
    pub salary: i64,
    pub schedule_blocks: Vec<ScheduleBlock>,
    /// 全シートのシフトを順につなげたもの（時給変更時の再計算用）
    #[serde(skip)]
    pub flattened_schedule: Vec<CellValue>,
}

impl MergedEmployee {
    fn refresh_salary(&mut self) {
        self.salary = self.base_salary + self.transport;
    }
}

/// 複数シート（複数店舗・複数月）の合算結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedPayroll {
    pub results: Vec<MergedEmployee>,
    pub total_salary: i64,
    pub period_label: Option<String>,
}

impl MergedPayroll {
    /// 名前が同じ従業員を合算する（初出順）
    pub fn merge(sheets: &[SheetPayroll]) -> Self {
        let mut results: Vec<MergedEmployee> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for sheet in sheets {
            let schedules = &sheet.payroll.schedules;
            for (idx, employee) in sheet.payroll.results.iter().enumerate() {
                let schedule = schedules.get(idx).cloned().unwrap_or_default();
                let block = sheet
                    .period
                    .filter(|_| !schedule.is_empty())
                    .map(|period| ScheduleBlock {
                        period,
                        schedule: schedule.clone(),
                        store_name: sheet.store_name.clone(),
                    });

                match index.get(&employee.name).copied() {
                    Some(pos) => {
                        let existing = &mut results[pos];
                        existing.base_wage = employee.base_wage;
                        existing.hours += employee.hours;
                        existing.days += employee.days;
                        existing.absent_days += employee.absent_days;
                        existing.overtime_hours += employee.overtime_hours;
                        existing.base_salary += employee.base_salary;
                        existing.flattened_schedule.extend(schedule.cells);
                        existing.schedule_blocks.extend(block);
                        existing.refresh_salary();
                    }
                    None => {
                        index.insert(employee.name.clone(), results.len());
                        let mut merged = MergedEmployee {
                            name: employee.name.clone(),
                            base_wage: employee.base_wage,
                            hours: employee.hours,
                            days: employee.days,
                            absent_days: employee.absent_days,
                            overtime_hours: employee.overtime_hours,
                            base_salary: employee.base_salary,
                            transport: employee.transport,
                            salary: 0,
                            schedule_blocks: block.into_iter().collect(),
                            flattened_schedule: schedule.cells,
                        };
                        merged.refresh_salary();
                        results.push(merged);
                    }
                }
            }
        }

        let periods: Vec<SheetPeriod> = sheets.iter().filter_map(|s| s.period).collect();
        let mut merged = Self {
            results,
            total_salary: 0,
            period_label: merged_period_label(&periods),
        };
        merged.refresh_total();
        debug!("{}シートを{}人分に合算", sheets.len(), merged.results.len());
        merged
    }

    pub fn employee(&self, name: &str) -> Option<&MergedEmployee> {
        self.results.iter().find(|e| e.name == name)
    }

    /// 交通費を設定して給与を再計算。該当者がいなければfalse
    pub fn set_transport(&mut self, name: &str, transport: i64) -> bool {
        let Some(employee) = self.results.iter_mut().find(|e| e.name == name) else {
            return false;
        };
        employee.transport = transport;
        employee.refresh_salary();
        self.refresh_total();
        true
    }

    /// 全員に同じ交通費を設定
    pub fn set_transport_all(&mut self, transport: i64) {
        for employee in &mut self.results {
            employee.transport = transport;
            employee.refresh_salary();
        }
        self.refresh_total();
    }

    /// 時給を変えて基本給を再計算（全期間のシフトをまとめて計算し直す）
    pub fn reprice(&mut self, name: &str, base_wage: f64, rates: &PayRates) -> Result<bool> {
        let rates = rates.with_base_wage(base_wage)?;
        let Some(employee) = self.results.iter_mut().find(|e| e.name == name) else {
            return Ok(false);
        };
        let summary = calculate_employee(&employee.flattened_schedule, &rates);
        employee.base_wage = base_wage;
        employee.base_salary = summary.salary;
        employee.refresh_salary();
        self.refresh_total();
        Ok(true)
    }

    fn refresh_total(&mut self) {
        self.total_salary = self.results.iter().map(|e| e.salary).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(year: i64, month: i64, names: &[&str], day1: &[&str], store_cell: Option<&str>) -> SheetTable {
        let mut rows = vec![Vec::new(); 37];
        rows[1] = vec![
            CellValue::Empty,
            CellValue::Empty,
            CellValue::from(year),
            CellValue::Empty,
            CellValue::from(month),
        ];
        rows[2] = vec![CellValue::Empty; 3];
        rows[2].extend(names.iter().map(|n| CellValue::from(*n)));
        rows[3] = vec![CellValue::Empty; 3];
        rows[3].extend(day1.iter().map(|c| CellValue::from(*c)));
        if let Some(store) = store_cell {
            rows[36] = vec![CellValue::Empty; 15];
            rows[36][14] = CellValue::from(store);
        }
        SheetTable::new(rows)
    }

    fn config() -> PayrollConfig {
        PayrollConfig::new(1000.0, 1.25, Vec::new()).unwrap()
    }

    #[test]
    fn merges_same_name_across_sheets() {
        let april = sheet(2024, 4, &["Alice", "Bob"], &["9-17", "9-19"], Some("古淵駅前店"));
        let may = sheet(2024, 5, &["Alice"], &["10-15"], None);
        let sheets = [
            SheetPayroll::from_table(&april, &config(), "夜勤"),
            SheetPayroll::from_table(&may, &config(), "夜勤"),
        ];
        let merged = MergedPayroll::merge(&sheets);

        assert_eq!(merged.results.len(), 2);
        let alice = merged.employee("Alice").unwrap();
        assert_eq!(alice.hours, 12.0);
        assert_eq!(alice.days, 2);
        assert_eq!(alice.base_salary, 12000);
        assert_eq!(alice.salary, 12000);
        assert_eq!(alice.schedule_blocks.len(), 2);
        assert_eq!(alice.schedule_blocks[0].store_name, "古淵駅前店");
        assert_eq!(alice.schedule_blocks[1].store_name, "夜勤");
        assert_eq!(alice.flattened_schedule.len(), 62);
        assert_eq!(merged.results[1].name, "Bob");
        assert_eq!(merged.total_salary, 12000 + 9250);
        assert_eq!(merged.period_label.as_deref(), Some("2024年4月16日～6月15日"));
    }

    #[test]
    fn sheet_without_period_has_no_blocks() {
        let mut table = sheet(2024, 4, &["Carol"], &["9-17"], None);
        table.rows[1].clear();
        let merged = MergedPayroll::merge(&[SheetPayroll::from_table(&table, &config(), "店")]);
        let carol = merged.employee("Carol").unwrap();
        assert!(carol.schedule_blocks.is_empty());
        assert_eq!(carol.days, 1);
        assert!(merged.period_label.is_none());
    }

    #[test]
    fn huge_year_cell_is_ignored() {
        let mut table = sheet(2024, 13, &["A"], &["9-17"], None);
        table.rows[1][2] = CellValue::Number(3_000_000_000.0);
        let sheet = SheetPayroll::from_table(&table, &config(), "店");
        assert!(sheet.period.is_none());
        assert_eq!(sheet.payroll.results[0].salary, 7000);
    }

    #[test]
    fn transport_is_added_to_salary() {
        let table = sheet(2024, 4, &["Alice", "Bob"], &["9-17", "9-19"], None);
        let mut merged = MergedPayroll::merge(&[SheetPayroll::from_table(&table, &config(), "店")]);

        assert!(merged.set_transport("Alice", 500));
        assert_eq!(merged.employee("Alice").unwrap().salary, 7500);
        assert_eq!(merged.total_salary, 7500 + 9250);
        assert!(!merged.set_transport("Nobody", 500));

        merged.set_transport_all(300);
        assert_eq!(merged.employee("Alice").unwrap().salary, 7300);
        assert_eq!(merged.employee("Bob").unwrap().salary, 9550);
        assert_eq!(merged.total_salary, 7300 + 9550);
    }

    #[test]
    fn reprice_recalculates_from_all_shifts() {
        let april = sheet(2024, 4, &["Alice"], &["9-17"], None);
        let may = sheet(2024, 5, &["Alice"], &["9-19"], None);
        let mut merged = MergedPayroll::merge(&[
            SheetPayroll::from_table(&april, &config(), "店"),
            SheetPayroll::from_table(&may, &config(), "店"),
        ]);
        merged.set_transport("Alice", 1000);

        assert!(merged.reprice("Alice", 1200.0, &config().rates).unwrap());
        let alice = merged.employee("Alice").unwrap();
        // 7h + 9h（うち残業1h）
        assert_eq!(alice.base_salary, 15 * 1200 + 1500);
        assert_eq!(alice.salary, alice.base_salary + 1000);
        assert_eq!(alice.base_wage, 1200.0);
        assert_eq!(merged.total_salary, alice.salary);

        assert!(merged.reprice("Alice", f64::NAN, &config().rates).is_err());
    }
}
