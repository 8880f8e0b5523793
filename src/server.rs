use axum::{
    routing::{get, post},
    Router, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    extract::State,
};
use chrono::{Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::attendance::{build_roster, AttendanceRoster, RosterSheet};
use crate::config::{RateOverrides, ServerConfig, StoreCatalog};
use crate::detail::{build_employee_detail, EmployeeDetail};
use crate::error::{PayrollError, Result};
use crate::export::{detail_file_stem, export_file_stem};
use crate::merge::{MergedPayroll, SheetPayroll};
use crate::payroll::{EmployeeResult, SheetTable};
use crate::period::SheetPeriod;
use crate::report::StoreSummary;
use crate::wage::PayRates;

/// アプリケーション状態（店舗設定を共有）
#[derive(Clone)]
pub struct AppState {
    pub stores: StoreCatalog,
}

/// 給与計算リクエスト（シート1枚）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRequest {
    pub table: SheetTable,
    #[serde(flatten)]
    pub rates: RateOverrides,
}

impl PayrollRequest {
    fn calculate(&self, stores: &StoreCatalog) -> Result<(SheetPayroll, PayRates)> {
        let (config, store_name) = stores.resolve(&self.rates)?;
        Ok((SheetPayroll::from_table(&self.table, &config, &store_name), config.rates))
    }
}

/// 給与計算レスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResponse {
    pub results: Vec<EmployeeResult>,
    pub total_salary: i64,
    pub period: Option<SheetPeriod>,
    pub period_label: Option<String>,
    pub store_name: String,
}

/// 月次サマリーレスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub summary: StoreSummary,
    pub period_label: Option<String>,
    pub store_name: String,
}

/// 複数シートの合算リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub sheets: Vec<PayrollRequest>,
    /// 全員共通の交通費
    pub transport: Option<i64>,
    /// 従業員名 → 変更後の基本時給
    #[serde(default)]
    pub wages: BTreeMap<String, f64>,
    #[serde(default)]
    pub include_details: bool,
}

/// 合算レスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    #[serde(flatten)]
    pub merged: MergedPayroll,
    /// 結果表を保存するときのファイル名（拡張子なし）
    pub export_file_stem: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<DetailEntry>,
}

/// 個人明細と保存用ファイル名
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailEntry {
    #[serde(flatten)]
    pub detail: EmployeeDetail,
    pub file_stem: String,
}

/// 当日出勤表リクエスト（日付省略時は今日）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayRequest {
    pub date: Option<NaiveDate>,
    pub sheets: Vec<PayrollRequest>,
}

/// エラーレスポンス
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for PayrollError {
    fn into_response(self) -> Response {
        let status = match &self {
            PayrollError::InvalidBaseWage(_)
            | PayrollError::InvalidOvertimeRate(_)
            | PayrollError::MissingRates => StatusCode::BAD_REQUEST,
            PayrollError::UnknownStore(_) => StatusCode::NOT_FOUND,
            PayrollError::Io(_) | PayrollError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("リクエスト処理に失敗: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// ルーター（テストからも使う）
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/stores", get(list_stores))
        .route("/api/payroll", post(calculate))
        .route("/api/report", post(report))
        .route("/api/merge", post(merge))
        .route("/api/today", post(today))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// HTTPサーバーを起動
pub async fn run(config: ServerConfig, stores: StoreCatalog) -> Result<()> {
    let app = router(AppState { stores });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!("Server listening on port {}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// ヘルスチェック
async fn health_check() -> &'static str {
    "OK"
}

/// 店舗設定一覧
async fn list_stores(State(state): State<Arc<AppState>>) -> Json<StoreCatalog> {
    Json(state.stores.clone())
}

/// シート1枚の給与計算
async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PayrollRequest>,
) -> Result<Json<PayrollResponse>> {
    let (sheet, _) = req.calculate(&state.stores)?;
    info!(
        "給与計算: {}人 合計{}円",
        sheet.payroll.results.len(),
        sheet.payroll.total_salary
    );

    Ok(Json(PayrollResponse {
        period_label: sheet.period.map(|p| p.label()),
        period: sheet.period,
        results: sheet.payroll.results,
        total_salary: sheet.payroll.total_salary,
        store_name: sheet.store_name,
    }))
}

/// 月次サマリー（店舗・期間ごとの合計）
async fn report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PayrollRequest>,
) -> Result<Json<ReportResponse>> {
    let (sheet, _) = req.calculate(&state.stores)?;

    Ok(Json(ReportResponse {
        summary: StoreSummary::from_payroll(&sheet.payroll),
        period_label: sheet.period.map(|p| p.report_label()),
        store_name: sheet.store_name,
    }))
}

/// 複数シートを従業員名で合算
///
/// 時給変更は最初のシートの残業倍率で再計算する。
async fn merge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResponse>> {
    let calculated = req
        .sheets
        .iter()
        .map(|sheet| sheet.calculate(&state.stores))
        .collect::<Result<Vec<_>>>()?;
    let rates = calculated.first().map(|(_, rates)| *rates);
    let sheets: Vec<SheetPayroll> = calculated.into_iter().map(|(sheet, _)| sheet).collect();

    let mut merged = MergedPayroll::merge(&sheets);
    if let Some(transport) = req.transport {
        merged.set_transport_all(transport);
    }
    if let Some(rates) = rates {
        for (name, wage) in &req.wages {
            if !merged.reprice(name, *wage, &rates)? {
                warn!("時給変更の対象が見つかりません: {}", name);
            }
        }
    }
    info!("合算: {}シート {}人 合計{}円", sheets.len(), merged.results.len(), merged.total_salary);

    let period = merged.period_label.clone().unwrap_or_default();
    let store_name = joined_store_names(&sheets);
    let details = if req.include_details {
        merged
            .results
            .iter()
            .map(|employee| DetailEntry {
                file_stem: detail_file_stem(&period, &store_name, &employee.name),
                detail: build_employee_detail(employee, ""),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(MergeResponse {
        export_file_stem: export_file_stem(&period, &store_name),
        merged,
        details,
    }))
}

/// シートの店舗名（重複なし、出てきた順）を "・" でつなぐ
fn joined_store_names(sheets: &[SheetPayroll]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for sheet in sheets {
        let name = sheet.store_name.as_str();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names.join("・")
}

/// 当日の時間帯別出勤表（全店舗）
async fn today(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TodayRequest>,
) -> Result<Json<AttendanceRoster>> {
    let now = Local::now();
    let date = req.date.unwrap_or_else(|| now.date_naive());
    let current_hour = (date == now.date_naive()).then(|| now.hour());

    let contexts = req
        .sheets
        .iter()
        .map(|sheet| state.stores.exclude_words_and_name(&sheet.rates))
        .collect::<Result<Vec<_>>>()?;
    let sheets: Vec<RosterSheet<'_>> = req
        .sheets
        .iter()
        .zip(&contexts)
        .map(|(sheet, (exclude_words, store_name))| RosterSheet {
            table: &sheet.table,
            store_name,
            exclude_words,
        })
        .collect();

    Ok(Json(build_roster(&sheets, date, current_hour)))
}
