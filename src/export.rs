use crate::cell_value::CellValue;
use crate::merge::MergedEmployee;

/// 結果表の見出し
pub const RESULT_HEADER: [&str; 6] = ["従業員名", "基本時給", "勤務時間", "出勤日数", "交通費", "給与"];
pub const TOTAL_LABEL: &str = "合計支払い給与";

/// ダウンロード用の結果表（見出し・従業員ごとの行・合計行）
///
/// CSV/XLSXへの書き出しは呼び出し側で行う。
pub fn export_rows(results: &[MergedEmployee]) -> Vec<Vec<CellValue>> {
    let mut rows = Vec::with_capacity(results.len() + 2);
    rows.push(RESULT_HEADER.iter().map(|h| CellValue::from(*h)).collect());

    for r in results {
        rows.push(vec![
            CellValue::from(r.name.as_str()),
            CellValue::Number(r.base_wage),
            CellValue::Number(r.hours),
            CellValue::from(i64::from(r.days)),
            CellValue::from(r.transport),
            CellValue::from(r.salary),
        ]);
    }

    let total: i64 = results.iter().map(|r| r.salary).sum();
    let mut total_row = vec![CellValue::from(TOTAL_LABEL)];
    total_row.extend(std::iter::repeat_with(|| CellValue::from("")).take(4));
    total_row.push(CellValue::from(total));
    rows.push(total_row);
    rows
}

/// ファイル名に使えない文字を `_` に置き換える
pub fn sanitize_file_name_component(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// 空でない部分を `_` でつなぐ（すべて空なら `fallback`）
fn join_file_name_parts(parts: &[&str], fallback: &str) -> String {
    let parts: Vec<String> = parts
        .iter()
        .map(|part| sanitize_file_name_component(part))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        fallback.to_string()
    } else {
        parts.join("_")
    }
}

/// 結果表のファイル名（拡張子なし）"期間_店舗名"
pub fn export_file_stem(period: &str, store_name: &str) -> String {
    join_file_name_parts(&[period, store_name], "result")
}

/// 個人明細のファイル名（拡張子なし）"期間_店舗名_従業員名_detail"
pub fn detail_file_stem(period: &str, store_name: &str, employee_name: &str) -> String {
    format!("{}_detail", join_file_name_parts(&[period, store_name, employee_name], "employee"))
}

/// 3桁区切りの数値表記（小数は3桁まで、末尾の0は省く）
pub fn format_grouped(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let rounded = (n * 1000.0).round() / 1000.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let abs = rounded.abs();
    let int_part = abs.trunc() as u64;
    let frac = format!("{:.3}", abs.fract());
    let frac = frac.trim_start_matches('0').trim_end_matches('0').trim_end_matches('.');

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, grouped, frac)
}
