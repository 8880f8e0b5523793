use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, Timelike};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use shift_payroll::attendance::{build_roster, RosterSheet};
use shift_payroll::cell_value::CellValue;
use shift_payroll::config::{parse_exclude_words, RateOverrides, ServerConfig, StoreCatalog};
use shift_payroll::export::{export_file_stem, export_rows};
use shift_payroll::merge::{MergedPayroll, SheetPayroll};
use shift_payroll::payroll::SheetTable;
use shift_payroll::Result;

#[derive(Parser)]
#[command(name = "shift-payroll", version, about = "シフト表から勤務時間と給与を計算する")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// HTTPサーバーを起動
    Serve {
        /// 待ち受けポート（省略時は PAYROLL_PORT、なければ3000）
        #[arg(long)]
        port: Option<u16>,
    },
    /// JSONのシート（行の配列）を読み込んで計算結果を出力
    Calc {
        #[arg(long)]
        input: PathBuf,
        /// 店舗キー（night, kobuchi など）
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        base_wage: Option<f64>,
        #[arg(long)]
        overtime: Option<f64>,
        /// 除外ワード（カンマ区切り）
        #[arg(long)]
        exclude: Option<String>,
        /// 結果表（見出し・合計行つき）とファイル名で出力
        #[arg(long)]
        export: bool,
    },
    /// シート（1店舗1ファイル）から指定日の時間帯別出勤表を出力
    Today {
        #[arg(long, required = true)]
        input: Vec<PathBuf>,
        /// 全シートに適用する店舗キー
        #[arg(long)]
        store: Option<String>,
        /// 対象日（YYYY-MM-DD、省略時は今日）
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// `calc --export` の出力
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportOutput {
    file_stem: String,
    rows: Vec<Vec<CellValue>>,
}

fn read_table(path: &PathBuf) -> Result<SheetTable> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let stores = StoreCatalog::from_env()?;

    match cli.command {
        Command::Serve { port } => {
            let mut config = ServerConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            shift_payroll::server::run(config, stores).await
        }
        Command::Calc { input, store, base_wage, overtime, exclude, export } => {
            let table = read_table(&input)?;
            let overrides = RateOverrides {
                store,
                base_wage,
                overtime,
                exclude_words: exclude.as_deref().map(parse_exclude_words),
            };
            let (config, store_name) = stores.resolve(&overrides)?;
            let sheet = SheetPayroll::from_table(&table, &config, &store_name);
            info!(
                "{}: {}人 合計{}円",
                input.display(),
                sheet.payroll.results.len(),
                sheet.payroll.total_salary
            );

            let output = if export {
                let merged = MergedPayroll::merge(std::slice::from_ref(&sheet));
                let period = merged.period_label.clone().unwrap_or_default();
                serde_json::to_string_pretty(&ExportOutput {
                    file_stem: export_file_stem(&period, &sheet.store_name),
                    rows: export_rows(&merged.results),
                })?
            } else {
                serde_json::to_string_pretty(&sheet.payroll)?
            };
            println!("{}", output);
            Ok(())
        }
        Command::Today { input, store, date } => {
            let tables = input.iter().map(read_table).collect::<Result<Vec<_>>>()?;
            let (exclude_words, store_name) = stores.exclude_words_and_name(&RateOverrides {
                store,
                ..Default::default()
            })?;
            let sheets: Vec<RosterSheet<'_>> = tables
                .iter()
                .map(|table| RosterSheet {
                    table,
                    store_name: &store_name,
                    exclude_words: &exclude_words,
                })
                .collect();

            let now = Local::now();
            let date = date.unwrap_or_else(|| now.date_naive());
            let current_hour = (date == now.date_naive()).then(|| now.hour());
            let roster = build_roster(&sheets, date, current_hour);
            info!("{}: {}店舗に出勤者あり", roster.date_label, roster.stores.len());
            println!("{}", serde_json::to_string_pretty(&roster)?);
            Ok(())
        }
    }
}
