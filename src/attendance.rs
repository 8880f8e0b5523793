use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::cell_value::CellValue;
use crate::payroll::{SheetTable, FIRST_DAY_ROW};
use crate::period::SheetPeriod;
use crate::shift_cell::TimeSegment;

pub const HOURS_PER_DAY: usize = 24;
const MINUTES_PER_DAY: i32 = 24 * 60;

const WEEKDAY_LABELS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// 1時間ごとの出勤者名（0時〜23時、名前は出てきた順）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HourlySlots {
    pub hours: Vec<Vec<String>>,
}

impl Default for HourlySlots {
    fn default() -> Self {
        Self {
            hours: vec![Vec::new(); HOURS_PER_DAY],
        }
    }
}

impl HourlySlots {
    pub fn has_attendance(&self) -> bool {
        self.hours.iter().any(|names| !names.is_empty())
    }

    pub fn names_at(&self, hour: usize) -> &[String] {
        self.hours.get(hour).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `start`〜`end`（0時からの分）と重なる時間帯に名前を入れる
    ///
    /// 0〜24時の外側は切り捨てる。
    pub fn fill(&mut self, start: i32, end: i32, name: &str) {
        let start = start.max(0);
        let end = end.min(MINUTES_PER_DAY);
        if end <= start {
            return;
        }
        let mut slot_start = start / 60 * 60;
        while slot_start < end {
            let overlap = end.min(slot_start + 60) - start.max(slot_start);
            let slot = &mut self.hours[(slot_start / 60) as usize];
            if overlap > 0 && !slot.iter().any(|n| n == name) {
                slot.push(name.to_string());
            }
            slot_start += 60;
        }
    }
}

/// 出勤表用のセル解析（カンマ・読点・空白区切り、解釈できない区間は捨てる）
pub fn parse_time_ranges(cell: &CellValue) -> Vec<TimeSegment> {
    cell.normalized()
        .split(|c: char| c == ',' || c == '、' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .filter_map(TimeSegment::parse)
        .collect()
}

/// 終了が開始以前なら日付を跨ぐ
fn is_overnight(segment: &TimeSegment) -> bool {
    segment.end_minutes() <= segment.start_minutes()
}

/// 指定日の時間帯別出勤者
///
/// 期間開始日から `target` までの日数でシフト行を決める。前日の夜勤は0時から終了時刻までを入れる。
/// 開始日より前、またはシートに行がなければNone。
pub fn build_slots_for_day(
    table: &SheetTable,
    period_start: NaiveDate,
    target: NaiveDate,
    exclude_words: &[String],
) -> Option<HourlySlots> {
    let offset = usize::try_from((target - period_start).num_days()).ok()?;
    let row = FIRST_DAY_ROW.checked_add(offset)?;
    if row >= table.rows.len() {
        return None;
    }

    let columns = table.employee_columns(exclude_words);
    let mut slots = HourlySlots::default();

    for (col, name) in &columns {
        for segment in parse_time_ranges(table.cell(row, *col)) {
            let end = if is_overnight(&segment) {
                MINUTES_PER_DAY
            } else {
                segment.end_minutes()
            };
            slots.fill(segment.start_minutes(), end, name);
        }
    }

    if offset > 0 {
        for (col, name) in &columns {
            for segment in parse_time_ranges(table.cell(row - 1, *col)) {
                if is_overnight(&segment) {
                    slots.fill(0, segment.end_minutes(), name);
                }
            }
        }
    }

    Some(slots)
}

/// "2024年4月20日（土）"
pub fn format_date_label(date: NaiveDate) -> String {
    format!(
        "{}年{}月{}日（{}）",
        date.year(),
        date.month(),
        date.day(),
        WEEKDAY_LABELS[date.weekday().num_days_from_sunday() as usize]
    )
}

/// 出勤表に渡す店舗1つ分のシート
#[derive(Debug, Clone, Copy)]
pub struct RosterSheet<'a> {
    pub table: &'a SheetTable,
    pub store_name: &'a str,
    pub exclude_words: &'a [String],
}

/// 店舗1つ分の当日の出勤者
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAttendance {
    pub store_name: String,
    pub period_label: String,
    pub slots: HourlySlots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RosterStatus {
    /// シートが1枚もない
    NoSheets,
    /// どのシートの期間にも入っていない
    OutOfPeriod,
    /// 期間内だが誰も出勤しない
    NoAttendance,
    Ready,
}

impl RosterStatus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            RosterStatus::NoSheets => Some("出勤予定を取得できませんでした。"),
            RosterStatus::OutOfPeriod => Some("選択した日は対象期間外です。"),
            RosterStatus::NoAttendance => Some("選択した日の出勤予定はありません。"),
            RosterStatus::Ready => None,
        }
    }
}

/// 全店舗の当日出勤表
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRoster {
    pub date: NaiveDate,
    pub date_label: String,
    /// 当日を表示しているときの現在時刻（時）
    pub current_hour: Option<u32>,
    /// 出勤者がいる店舗のみ
    pub stores: Vec<StoreAttendance>,
    /// 対象期間の表示（重複なし）
    pub period_labels: Vec<String>,
    pub status: RosterStatus,
}

/// 複数店舗のシートから `date` の出勤表を作る
pub fn build_roster(sheets: &[RosterSheet<'_>], date: NaiveDate, current_hour: Option<u32>) -> AttendanceRoster {
    let mut stores = Vec::new();
    let mut active_labels = Vec::new();
    let mut all_labels = Vec::new();
    let mut any_active = false;

    for sheet in sheets {
        let Some(period) = SheetPeriod::from_table(sheet.table) else {
            continue;
        };
        let label = period.label();
        all_labels.push(label.clone());
        if !period.contains(date) {
            continue;
        }
        any_active = true;
        active_labels.push(label.clone());

        let slots = build_slots_for_day(sheet.table, period.start_date, date, sheet.exclude_words)
            .unwrap_or_default();
        if slots.has_attendance() {
            stores.push(StoreAttendance {
                store_name: sheet.store_name.to_string(),
                period_label: label,
                slots,
            });
        }
    }

    let status = if sheets.is_empty() {
        RosterStatus::NoSheets
    } else if !any_active {
        RosterStatus::OutOfPeriod
    } else if stores.is_empty() {
        RosterStatus::NoAttendance
    } else {
        RosterStatus::Ready
    };

    let mut period_labels = Vec::new();
    for label in if active_labels.is_empty() { all_labels } else { active_labels } {
        if !period_labels.contains(&label) {
            period_labels.push(label);
        }
    }

    AttendanceRoster {
        date,
        date_label: format_date_label(date),
        current_hour,
        stores,
        period_labels,
        status,
    }
}
