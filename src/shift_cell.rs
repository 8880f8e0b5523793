use once_cell::sync::Lazy;
use regex::Regex;

use crate::cell_value::CellValue;

/// 欠勤マーカー
pub const ABSENCE_MARKER: &str = "欠勤";

const MINUTES_PER_DAY: i32 = 24 * 60;

/// "9-17" / "9:30-17:45" 形式（ASCII数字のみ）
static TIME_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2})(?::([0-9]{2}))?-([0-9]{1,2})(?::([0-9]{2}))?$")
        .expect("TIME_RANGE_REGEX is a valid pattern")
});

/// 時刻範囲1つ分（"22-6" のように日付を跨ぐものを含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSegment {
    pub start_hour: u32,
    /// 分が書かれていなければNone（"9-17"）
    pub start_minute: Option<u32>,
    pub end_hour: u32,
    pub end_minute: Option<u32>,
}

impl TimeSegment {
    /// 1区間をパース。形式違い・範囲外はNone
    pub fn parse(text: &str) -> Option<Self> {
        let caps = TIME_RANGE_REGEX.captures(text.trim())?;
        let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

        let segment = TimeSegment {
            start_hour: number(1)?,
            start_minute: number(2),
            end_hour: number(3)?,
            end_minute: number(4),
        };
        segment.is_in_range().then_some(segment)
    }

    fn is_in_range(&self) -> bool {
        let hour_ok = |h: u32| h <= 24;
        let minute_ok = |m: Option<u32>| m.map_or(true, |m| m <= 59);
        hour_ok(self.start_hour)
            && hour_ok(self.end_hour)
            && minute_ok(self.start_minute)
            && minute_ok(self.end_minute)
    }

    /// 開始時刻（0時からの分）
    pub fn start_minutes(&self) -> i32 {
        (self.start_hour * 60 + self.start_minute.unwrap_or(0)) as i32
    }

    /// 終了時刻（0時からの分）
    pub fn end_minutes(&self) -> i32 {
        (self.end_hour * 60 + self.end_minute.unwrap_or(0)) as i32
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_minutes() < self.start_minutes()
    }

    /// 勤務時間（分）。終了が開始より前なら翌日まで跨ぐとみなす
    ///
    /// "24:30-0" のような入力では負になりうる（そのまま合算する）
    pub fn duration_minutes(&self) -> i32 {
        let start = self.start_minutes();
        let end = self.end_minutes();
        if end >= start {
            end - start
        } else {
            MINUTES_PER_DAY - start + end
        }
    }

    pub fn hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    /// 表示用 "09時～17時30分"（分は入力に書かれていた場合のみ）
    pub fn display(&self) -> String {
        format!(
            "{}～{}",
            clock_label(self.start_hour, self.start_minute),
            clock_label(self.end_hour, self.end_minute)
        )
    }

    /// 正規化した "09:00-17:30"（重複判定・並び替え用）
    pub fn canonical(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.start_hour,
            self.start_minute.unwrap_or(0),
            self.end_hour,
            self.end_minute.unwrap_or(0)
        )
    }
}

fn clock_label(hour: u32, minute: Option<u32>) -> String {
    match minute {
        Some(m) => format!("{:02}時{:02}分", hour, m),
        None => format!("{:02}時", hour),
    }
}

/// 1日分のセルの解析結果
#[derive(Debug, Clone, PartialEq)]
pub enum ShiftCell {
    /// 空セル（シフトなし）
    Empty,
    /// 欠勤
    Absence,
    /// カンマ区切りの時刻範囲。解釈できた区間のみ保持（0件もありうる）
    Segments(Vec<TimeSegment>),
}

impl ShiftCell {
    pub fn parse(cell: &CellValue) -> Self {
        Self::parse_text(&cell.normalized())
    }

    pub fn parse_text(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return ShiftCell::Empty;
        }
        if text == ABSENCE_MARKER {
            return ShiftCell::Absence;
        }
        // 解釈できない区間は黙って捨てる
        let segments = text.split(',').filter_map(TimeSegment::parse).collect();
        ShiftCell::Segments(segments)
    }

    pub fn segments(&self) -> &[TimeSegment] {
        match self {
            ShiftCell::Segments(segments) => segments,
            ShiftCell::Empty | ShiftCell::Absence => &[],
        }
    }

    /// 区間の合計時間（控除前）
    pub fn day_hours(&self) -> f64 {
        self.segments().iter().map(TimeSegment::hours).sum()
    }

    /// 有効な区間があり、合計が正なら出勤日
    pub fn is_workday(&self) -> bool {
        !self.segments().is_empty() && self.day_hours() > 0.0
    }

    pub fn is_absence(&self) -> bool {
        matches!(self, ShiftCell::Absence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hour_only_range() {
        let seg = TimeSegment::parse("9-17").unwrap();
        assert_eq!(seg.start_minutes(), 9 * 60);
        assert_eq!(seg.end_minutes(), 17 * 60);
        assert_eq!(seg.hours(), 8.0);
        assert!(!seg.crosses_midnight());
    }

    #[test]
    fn parses_minutes() {
        let seg = TimeSegment::parse(" 9:30-17:45 ").unwrap();
        assert_eq!(seg.duration_minutes(), 8 * 60 + 15);
        assert_eq!(seg.hours(), 8.25);
    }

    #[test]
    fn midnight_crossing_wraps() {
        let seg = TimeSegment::parse("22-6").unwrap();
        assert!(seg.crosses_midnight());
        assert_eq!(seg.hours(), 8.0);
    }

    #[test]
    fn equal_start_and_end_is_zero() {
        assert_eq!(TimeSegment::parse("9-9").unwrap().duration_minutes(), 0);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(TimeSegment::parse("25-3").is_none());
        assert!(TimeSegment::parse("9:60-17").is_none());
        assert!(TimeSegment::parse("9-17:75").is_none());
        assert!(TimeSegment::parse("24-24").is_some());
    }

    #[test]
    fn edges_of_the_day() {
        let whole = TimeSegment::parse("0-24").unwrap();
        assert_eq!(whole.duration_minutes(), 24 * 60);
        assert_eq!(whole.hours(), 24.0);

        let late = TimeSegment::parse("22-24").unwrap();
        assert!(!late.crosses_midnight());
        assert_eq!(late.hours(), 2.0);

        let odd = TimeSegment::parse("24:30-0").unwrap();
        assert!(odd.crosses_midnight());
        assert_eq!(odd.duration_minutes(), -30);
    }

    #[test]
    fn negative_total_is_not_a_workday() {
        let cell = ShiftCell::parse_text("24:30-0,0-0:10");
        assert_eq!(cell.segments().len(), 2);
        assert!(cell.day_hours() < 0.0);
        assert!(!cell.is_workday());
    }

    #[test]
    fn rejects_other_shapes() {
        for text in ["9時-17時", "9~17", "9-", "-17", "123-4", "9:5-17", "９-１７", "garbage"] {
            assert!(TimeSegment::parse(text).is_none(), "{text}");
        }
    }

    #[test]
    fn absence_and_empty_cells() {
        assert_eq!(ShiftCell::parse_text(" 欠勤 "), ShiftCell::Absence);
        assert_eq!(ShiftCell::parse_text("  "), ShiftCell::Empty);
        assert_eq!(ShiftCell::parse(&CellValue::Empty), ShiftCell::Empty);
        assert!(!ShiftCell::parse_text("欠勤予定").is_absence());
    }

    #[test]
    fn garbage_segment_does_not_invalidate_cell() {
        let cell = ShiftCell::parse_text("9-17,garbage");
        assert_eq!(cell.segments().len(), 1);
        assert_eq!(cell.day_hours(), 8.0);
        assert!(cell.is_workday());
    }

    #[test]
    fn split_shift_sums_segments() {
        let cell = ShiftCell::parse_text("9-12, 13:30-18");
        assert_eq!(cell.day_hours(), 7.5);
    }

    #[test]
    fn all_invalid_or_zero_is_not_workday() {
        assert!(!ShiftCell::parse_text("休み").is_workday());
        assert!(!ShiftCell::parse_text("9-9").is_workday());
        assert!(!ShiftCell::Absence.is_workday());
    }

    #[test]
    fn numeric_cell_is_not_a_shift() {
        let cell = ShiftCell::parse(&CellValue::Number(9.0));
        assert_eq!(cell, ShiftCell::Segments(vec![]));
        assert!(!cell.is_workday());
    }

    #[test]
    fn display_and_canonical_forms() {
        let seg = TimeSegment::parse("9-17:30").unwrap();
        assert_eq!(seg.display(), "09時～17時30分");
        assert_eq!(seg.canonical(), "09:00-17:30");
    }
}
