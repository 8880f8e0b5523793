use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::payroll::SheetTable;

/// 年が入っているセル
const YEAR_CELL: (usize, usize) = (1, 2);
/// 開始月が入っているセル
const START_MONTH_CELL: (usize, usize) = (1, 4);
/// 店舗名が入っているセル
const STORE_NAME_CELL: (usize, usize) = (36, 14);

/// 期間の開始日・締め日
const PERIOD_START_DAY: u32 = 16;
const PERIOD_END_DAY: u32 = 15;

/// シートの給与期間（開始月16日〜翌月15日）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SheetPeriod {
    /// 開始年月から期間を作る（13月などは翌年に繰り越す）
    pub fn from_year_month(year: i32, start_month: i32) -> Option<Self> {
        let start_date = month_day(year, start_month, PERIOD_START_DAY)?;
        let end_date = month_day(year, start_month.checked_add(1)?, PERIOD_END_DAY)?;
        Some(Self { start_date, end_date })
    }

    /// シートの年・開始月セルから読む。どちらかが数値でなければNone
    pub fn from_table(table: &SheetTable) -> Option<Self> {
        let year = table.cell(YEAR_CELL.0, YEAR_CELL.1).leading_int()?;
        let start_month = table.cell(START_MONTH_CELL.0, START_MONTH_CELL.1).leading_int()?;
        Self::from_year_month(year, start_month)
    }

    /// "2024年4月16日～5月15日"
    pub fn label(&self) -> String {
        format_range(self.start_date, self.end_date)
    }

    /// "2024年4月度（4月16日〜5月15日）"
    pub fn report_label(&self) -> String {
        let (start, end) = (self.start_date, self.end_date);
        let end_label = if end.year() != start.year() {
            format!("{}年{}月", end.year(), end.month())
        } else {
            format!("{}月", end.month())
        };
        format!(
            "{}年{}月度（{}月{}日〜{}{}日）",
            start.year(),
            start.month(),
            start.month(),
            start.day(),
            end_label,
            end.day()
        )
    }

    /// 開始日〜締め日（両端を含む）に入っているか
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// シフト行 `day_index`（0始まり）の日付
    pub fn date_for_day(&self, day_index: usize) -> Option<NaiveDate> {
        self.start_date.checked_add_days(Days::new(day_index as u64))
    }
}

/// 年・月（範囲外は繰り越し）・日から日付を作る
fn month_day(year: i32, month: i32, day: u32) -> Option<NaiveDate> {
    let index = month.checked_sub(1)?;
    let year = year.checked_add(index.div_euclid(12))?;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// "2024年4月16日～5月15日"（年が変わる場合は終了側にも年を付ける）
pub fn format_range(start: NaiveDate, end: NaiveDate) -> String {
    let end_year = if end.year() == start.year() {
        String::new()
    } else {
        format!("{}年", end.year())
    };
    format!(
        "{}年{}月{}日～{}{}月{}日",
        start.year(),
        start.month(),
        start.day(),
        end_year,
        end.month(),
        end.day()
    )
}

/// シート記載の店舗名
pub fn sheet_store_name(table: &SheetTable) -> Option<String> {
    let name = table.cell(STORE_NAME_CELL.0, STORE_NAME_CELL.1).normalized();
    (!name.is_empty()).then_some(name)
}

/// 複数シートの期間を日付順に並べ、連続する（間が1日以内の）ものをまとめる
pub fn merge_period_ranges(periods: &[SheetPeriod]) -> Vec<(NaiveDate, NaiveDate)> {
    let mut sorted: Vec<_> = periods.to_vec();
    sorted.sort_by_key(|p| p.start_date);

    let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::new();
    for period in sorted {
        match merged.last_mut() {
            Some((_, end)) if (period.start_date - *end).num_days() <= 1 => {
                if period.end_date > *end {
                    *end = period.end_date;
                }
            }
            _ => merged.push((period.start_date, period.end_date)),
        }
    }
    merged
}

/// 複数シート選択時の表示 "2024年3月16日～5月15日 ／ 2024年8月16日～9月15日"
pub fn merged_period_label(periods: &[SheetPeriod]) -> Option<String> {
    let labels: Vec<String> = merge_period_ranges(periods)
        .into_iter()
        .map(|(start, end)| format_range(start, end))
        .collect();
    (!labels.is_empty()).then(|| labels.join(" ／ "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_value::CellValue;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table_with(year: CellValue, month: CellValue) -> SheetTable {
        let mut rows = vec![Vec::new(); 2];
        rows[1] = vec![CellValue::Empty, CellValue::Empty, year, CellValue::Empty, month];
        SheetTable::new(rows)
    }

    #[test]
    fn reads_period_from_sheet() {
        let period = SheetPeriod::from_table(&table_with(CellValue::Number(2024.0), CellValue::from("4月"))).unwrap();
        assert_eq!(period.start_date, date(2024, 4, 16));
        assert_eq!(period.end_date, date(2024, 5, 15));
        assert_eq!(period.label(), "2024年4月16日～5月15日");
        assert_eq!(period.report_label(), "2024年4月度（4月16日〜5月15日）");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let period = SheetPeriod::from_year_month(2024, 12).unwrap();
        assert_eq!(period.end_date, date(2025, 1, 15));
        assert_eq!(period.label(), "2024年12月16日～2025年1月15日");
        assert_eq!(period.report_label(), "2024年12月度（12月16日〜2025年1月15日）");
    }

    #[test]
    fn missing_cells_mean_no_period() {
        assert!(SheetPeriod::from_table(&SheetTable::default()).is_none());
        assert!(SheetPeriod::from_table(&table_with(CellValue::from("令和"), CellValue::from("4"))).is_none());
    }

    #[test]
    fn out_of_range_year_means_no_period() {
        let huge = table_with(CellValue::Number(3_000_000_000.0), CellValue::Number(13.0));
        assert!(SheetPeriod::from_table(&huge).is_none());
        assert!(SheetPeriod::from_year_month(i32::MAX, 13).is_none());
        assert!(SheetPeriod::from_year_month(i32::MIN, -11).is_none());
        assert!(SheetPeriod::from_year_month(2024, i32::MAX).is_none());
        assert!(SheetPeriod::from_year_month(2024, i32::MIN).is_none());
    }

    #[test]
    fn day_index_maps_to_date() {
        let period = SheetPeriod::from_year_month(2024, 1).unwrap();
        assert_eq!(period.date_for_day(0), Some(date(2024, 1, 16)));
        assert_eq!(period.date_for_day(16), Some(date(2024, 2, 1)));
        assert!(period.contains(date(2024, 1, 16)));
        assert!(period.contains(date(2024, 2, 15)));
        assert!(!period.contains(date(2024, 2, 16)));
    }

    #[test]
    fn merges_adjacent_periods() {
        let periods = [
            SheetPeriod::from_year_month(2024, 4).unwrap(),
            SheetPeriod::from_year_month(2024, 3).unwrap(),
            SheetPeriod::from_year_month(2024, 8).unwrap(),
        ];
        let merged = merge_period_ranges(&periods);
        assert_eq!(merged, vec![(date(2024, 3, 16), date(2024, 5, 15)), (date(2024, 8, 16), date(2024, 9, 15))]);
        assert_eq!(
            merged_period_label(&periods).unwrap(),
            "2024年3月16日～5月15日 ／ 2024年8月16日～9月15日"
        );
        assert!(merged_period_label(&[]).is_none());
    }

    #[test]
    fn store_name_cell() {
        let mut rows = vec![Vec::new(); 37];
        rows[36] = vec![CellValue::Empty; 15];
        rows[36][14] = CellValue::from(" 古淵駅前店 ");
        assert_eq!(sheet_store_name(&SheetTable::new(rows)).as_deref(), Some("古淵駅前店"));
        assert_eq!(sheet_store_name(&SheetTable::default()), None);
    }
}
