use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::cell_value::CellValue;
use crate::export::format_grouped;
use crate::merge::MergedEmployee;
use crate::shift_cell::ShiftCell;

pub const NO_RECORDS_LABEL: &str = "出勤記録がありません";

/// 明細の1行（月見出し、または1日分）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DetailRow {
    /// "2024年4月"
    Month { label: String },
    /// "16日" と、その日の勤務時間帯・店舗名（同じ並び）
    #[serde(rename_all = "camelCase")]
    Day {
        date_label: String,
        times: Vec<String>,
        stores: Vec<String>,
    },
}

/// 従業員1人分の勤務明細
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    pub employee_name: String,
    pub summary_lines: Vec<String>,
    pub rows: Vec<DetailRow>,
}

/// 1日の中の時間帯（正規化した "09:00-17:00" ごとにまとめる）
#[derive(Debug, Default)]
struct DaySegment {
    display: String,
    stores: BTreeSet<String>,
}

/// 合算済みの従業員から日別の勤務明細を作る
///
/// 店舗名が空のブロックは `fallback_store_name` を使う。
pub fn build_employee_detail(employee: &MergedEmployee, fallback_store_name: &str) -> EmployeeDetail {
    let mut entries: BTreeMap<NaiveDate, BTreeMap<String, DaySegment>> = BTreeMap::new();

    for block in &employee.schedule_blocks {
        let store_name = match block.store_name.trim() {
            "" => fallback_store_name.trim(),
            name => name,
        };
        for (day_index, cell) in block.schedule.cells.iter().enumerate() {
            let shift = ShiftCell::parse(cell);
            if shift.segments().is_empty() {
                continue;
            }
            let Some(date) = block.period.date_for_day(day_index) else {
                continue;
            };
            let day = entries.entry(date).or_default();
            for segment in shift.segments() {
                let entry = day.entry(segment.canonical()).or_insert_with(|| DaySegment {
                    display: segment.display(),
                    stores: BTreeSet::new(),
                });
                if !store_name.is_empty() {
                    entry.stores.insert(store_name.to_string());
                }
            }
        }
    }

    let mut rows = Vec::new();
    let mut current_month = None;
    for (date, segments) in entries {
        let month_key = (date.year(), date.month());
        if current_month != Some(month_key) {
            current_month = Some(month_key);
            rows.push(DetailRow::Month {
                label: format!("{}年{}月", date.year(), date.month()),
            });
        }
        let (times, stores): (Vec<String>, Vec<String>) = segments
            .into_values()
            .map(|seg| (seg.display, seg.stores.into_iter().collect::<Vec<_>>().join("、")))
            .unzip();
        rows.push(DetailRow::Day {
            date_label: format!("{}日", date.day()),
            times,
            stores,
        });
    }

    EmployeeDetail {
        employee_name: employee.name.clone(),
        summary_lines: summary_lines(employee),
        rows,
    }
}

fn summary_lines(employee: &MergedEmployee) -> Vec<String> {
    vec![
        format!("基本時給：{}円", format_grouped(employee.base_wage)),
        format!("総勤務時間：{:.2}時間", employee.hours),
        format!("出勤日数：{}日", employee.days),
        format!("交通費：{}円", format_grouped(employee.transport as f64)),
        format!("給与：{}円", format_grouped(employee.salary as f64)),
    ]
}

impl EmployeeDetail {
    /// ダウンロード用の表（名前・サマリー・日別行）
    pub fn export_rows(&self) -> Vec<Vec<CellValue>> {
        let mut rows: Vec<Vec<CellValue>> = vec![vec![
            CellValue::from("従業員名"),
            CellValue::from(self.employee_name.as_str()),
        ]];
        if !self.summary_lines.is_empty() {
            rows.push(Vec::new());
            rows.extend(self.summary_lines.iter().map(|line| vec![CellValue::from(line.as_str())]));
        }
        rows.push(Vec::new());

        if self.rows.is_empty() {
            rows.push(vec![CellValue::from(NO_RECORDS_LABEL)]);
            return rows;
        }
        for row in &self.rows {
            match row {
                DetailRow::Month { label } => {
                    rows.push(vec![CellValue::from(label.as_str()), CellValue::from(""), CellValue::from("")]);
                }
                DetailRow::Day { date_label, times, stores } => {
                    rows.push(vec![
                        CellValue::from(date_label.as_str()),
                        CellValue::from(times.join("\n")),
                        CellValue::from(stores.join("\n")),
                    ]);
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ScheduleBlock;
    use crate::period::SheetPeriod;
    use crate::timecard_data::EmployeeSchedule;

    fn block(period: SheetPeriod, cells: &[&str], store: &str) -> ScheduleBlock {
        ScheduleBlock {
            period,
            schedule: EmployeeSchedule::new(cells.iter().map(|c| CellValue::from(*c)).collect()),
            store_name: store.to_string(),
        }
    }

    fn employee(blocks: Vec<ScheduleBlock>) -> MergedEmployee {
        MergedEmployee {
            name: "山田".to_string(),
            base_wage: 1000.0,
            hours: 24.0,
            days: 3,
            absent_days: 0,
            overtime_hours: 1.0,
            base_salary: 24250,
            transport: 0,
            salary: 24250,
            schedule_blocks: blocks,
            flattened_schedule: Vec::new(),
        }
    }

    #[test]
    fn summary_lines_use_grouping() {
        let detail = build_employee_detail(&employee(Vec::new()), "");
        assert_eq!(
            detail.summary_lines,
            vec![
                "基本時給：1,000円",
                "総勤務時間：24.00時間",
                "出勤日数：3日",
                "交通費：0円",
                "給与：24,250円",
            ]
        );
        assert!(detail.rows.is_empty());
        let rows = detail.export_rows();
        assert_eq!(rows.last().unwrap(), &vec![CellValue::from(NO_RECORDS_LABEL)]);
    }

    #[test]
    fn groups_days_by_month_and_merges_stores() {
        let april = SheetPeriod::from_year_month(2024, 4).unwrap();
        let blocks = vec![
            block(april, &["9-17", "", "欠勤", "13:30-18,9-12"], "古淵駅前店"),
            block(april, &["9-17", "garbage"], "夜勤"),
            block(SheetPeriod::from_year_month(2024, 5).unwrap(), &["", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "22-6"], ""),
        ];
        let detail = build_employee_detail(&employee(blocks), "相模原東大沼店");

        assert_eq!(
            detail.rows,
            vec![
                DetailRow::Month { label: "2024年4月".to_string() },
                DetailRow::Day {
                    date_label: "16日".to_string(),
                    times: vec!["09時～17時".to_string()],
                    stores: vec!["古淵駅前店、夜勤".to_string()],
                },
                DetailRow::Day {
                    date_label: "19日".to_string(),
                    times: vec!["09時～12時".to_string(), "13時30分～18時".to_string()],
                    stores: vec!["古淵駅前店".to_string(), "古淵駅前店".to_string()],
                },
                DetailRow::Month { label: "2024年6月".to_string() },
                DetailRow::Day {
                    date_label: "1日".to_string(),
                    times: vec!["22時～06時".to_string()],
                    stores: vec!["相模原東大沼店".to_string()],
                },
            ]
        );

        let rows = detail.export_rows();
        assert_eq!(rows[0], vec![CellValue::from("従業員名"), CellValue::from("山田")]);
        assert_eq!(
            rows.last().unwrap(),
            &vec![CellValue::from("1日"), CellValue::from("22時～06時"), CellValue::from("相模原東大沼店")]
        );
    }
}
