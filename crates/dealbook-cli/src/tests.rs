//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::FixedOffset;
use dealbook_core::{Config, Dataset, DashboardOptions, Snapshot};
use tempfile::TempDir;

use crate::cli::SourceArgs;
use crate::commands::{self, truncate, ExportKind};

const PAYMENTS_CSV: &str = "Покупатель,Статус оплаты,Форма оплаты\n\
                            Acme,оплачено,аккредитив\n\
                            Globex,не оплачено,TT\n\
                            Initech,оплачено,\n";

const DEALS_CSV: &str = "Покупатель,Продукт,Объем продажи\n\
                         Acme,Пшеница,100\n";

const DASHBOARD_JSON: &str = r#"{
    "data": [
        {"Покупатель": "Acme", "Продукт": "Пшеница", "Базис": "FCA", "Объем продажи": 100, "Сумма, тыс. CNY": 500, "Цена продажи, тыс. CNY": 5, "Дата подтверждения сделки": "2025-03-10"},
        {"Покупатель": "Globex", "Продукт": "Ячмень", "Базис": "CPT", "Объем продажи": 300, "Сумма, тыс. CNY": 900, "Цена продажи, тыс. CNY": 3, "Дата подтверждения сделки": "2025-07-01"},
        {"Покупатель": "Acme", "Продукт": "Пшеница", "Объем продажи": 50, "Дата подтверждения сделки": "2024-12-31"}
    ],
    "payments": [
        {"Покупатель": "Acme", "Статус оплаты": "оплачено", "Форма оплаты": "аккредитив", "Дата отправки документов": "2025-03-01", "Дата поступления средств": "2025-03-11"}
    ],
    "debts": [
        {"Инициатор претензии": "Покупатель", "Ответственный": "Иванов", "Тип претензии": "Качество", "Сумма": 10}
    ]
}"#;

fn setup_workbook() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let sheets = dir.path().join("sheets");
    std::fs::create_dir_all(&sheets).unwrap();
    std::fs::write(sheets.join("Получение средств.csv"), PAYMENTS_CSV).unwrap();
    std::fs::write(sheets.join("Лист 1.csv"), DEALS_CSV).unwrap();

    let mut config = Config::default();
    config.export.workbook = sheets;
    config.export.output_dir = dir.path().join("exports");
    (dir, config)
}

fn setup_snapshot() -> (Snapshot, DashboardOptions) {
    let config = Config::default();
    let dataset = Dataset::parse(DASHBOARD_JSON).unwrap();
    let offset = FixedOffset::east_opt(3 * 3600).unwrap();
    let snapshot = Snapshot::new(dataset, &config.fields, 2025, offset);
    let options = DashboardOptions::from_config(&config).unwrap();
    (snapshot, options)
}

fn exported_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long string", 10), "this is...");
}

#[test]
fn test_truncate_cyrillic() {
    assert_eq!(truncate("Получение средств", 8), "Получ...");
}

#[test]
fn test_export_kind_parse() {
    assert_eq!("deals".parse::<ExportKind>().unwrap(), ExportKind::Deals);
    assert_eq!("Payments".parse::<ExportKind>().unwrap(), ExportKind::Payments);
    assert_eq!(
        "payments-stats".parse::<ExportKind>().unwrap(),
        ExportKind::PaymentsStats
    );
    assert_eq!("paid-only".parse::<ExportKind>().unwrap(), ExportKind::PaidOnly);
    assert!("everything".parse::<ExportKind>().is_err());
}

#[test]
fn test_export_kind_defaults() {
    assert_eq!(ExportKind::Deals.default_sheet(), "Лист 1");
    assert_eq!(ExportKind::PaidOnly.default_sheet(), "Получение средств");
    assert!(!ExportKind::Payments.options(2025, false).metadata);
    assert!(ExportKind::PaymentsStats.options(2025, false).stats);
    assert_eq!(
        ExportKind::Deals.options(2025, true).prefix,
        "Итоги_года_2025"
    );
    assert!(ExportKind::PaidOnly.options(2025, false).status_filter.is_some());
}

// ========== Export Command Tests ==========

#[test]
fn test_cmd_export_payments_bare() {
    let (dir, config) = setup_workbook();
    let result = commands::cmd_export(&config, "payments", None, None, None, false);
    assert!(result.is_ok());

    let files = exported_files(&dir.path().join("exports"));
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("payments_2"));

    let content = std::fs::read_to_string(dir.path().join("exports").join(&files[0])).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[test]
fn test_cmd_export_payments_with_stats() {
    let (dir, config) = setup_workbook();
    let result = commands::cmd_export(&config, "payments-stats", None, None, None, false);
    assert!(result.is_ok());

    let files = exported_files(&dir.path().join("exports"));
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("payments_with_stats_"));

    let content = std::fs::read_to_string(dir.path().join("exports").join(&files[0])).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["metadata"]["totalRecords"], 3);
    assert_eq!(json["metadata"]["paidCount"], 2);
    assert_eq!(json["payments"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cmd_export_paid_only() {
    let (dir, config) = setup_workbook();
    let result = commands::cmd_export(&config, "paid-only", None, None, None, false);
    assert!(result.is_ok());

    let files = exported_files(&dir.path().join("exports"));
    assert!(files[0].starts_with("payments_paid_only_"));

    let content = std::fs::read_to_string(dir.path().join("exports").join(&files[0])).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[test]
fn test_cmd_export_deals_with_metadata_and_output_override() {
    let (dir, config) = setup_workbook();
    let output = dir.path().join("elsewhere");
    let result = commands::cmd_export(&config, "deals", None, None, Some(&output), true);
    assert!(result.is_ok());

    let files = exported_files(&output);
    assert!(files[0].starts_with("Итоги_года_2025_"));

    let content = std::fs::read_to_string(output.join(&files[0])).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["metadata"]["totalRecords"], 1);
    assert_eq!(json["data"][0]["Покупатель"], "Acme");
}

#[test]
fn test_cmd_export_unknown_kind() {
    let (_dir, config) = setup_workbook();
    let result = commands::cmd_export(&config, "everything", None, None, None, false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_export_missing_sheet() {
    let (_dir, config) = setup_workbook();
    let result = commands::cmd_export(&config, "deals", Some("Нет такого"), None, None, false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_preview() {
    let (_dir, config) = setup_workbook();
    let result = commands::cmd_preview(&config, "Получение средств", None, 2);
    assert!(result.is_ok());
}

#[test]
fn test_cmd_preview_missing_sheet() {
    let (_dir, config) = setup_workbook();
    let result = commands::cmd_preview(&config, "Нет такого", None, 5);
    assert!(result.is_err());
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_report_sections() {
    let (snapshot, options) = setup_snapshot();
    assert_eq!(snapshot.deals.len(), 2);

    assert!(commands::cmd_report_hero(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_monthly(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_clients(&snapshot, &options, 5).is_ok());
    assert!(commands::cmd_report_products(&snapshot, &options, 5).is_ok());
    assert!(commands::cmd_report_prices(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_basis(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_geography(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_records(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_timeline(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_final(&snapshot, &options).is_ok());
    assert!(commands::cmd_report_payments(&snapshot, &options, false).is_ok());
    assert!(commands::cmd_report_payments(&snapshot, &options, true).is_ok());
    assert!(commands::cmd_report_purchases(&snapshot, &options, 10).is_ok());
    assert!(commands::cmd_report_debts(&snapshot, &options).is_ok());
}

#[test]
fn test_cmd_report_debts_with_agents() {
    let (snapshot, options) = setup_snapshot();
    let report = dealbook_core::dashboard::debt_report(&snapshot.debts, &options.fields.debts);
    assert_eq!(report.by_agent.len(), 1);
    assert_eq!(report.by_agent[0].key, "Иванов");

    assert!(commands::cmd_report_debts(&snapshot, &options).is_ok());
}

#[test]
fn test_cmd_report_sections_empty_snapshot() {
    let config = Config::default();
    let snapshot = Snapshot::new(
        Dataset::default(),
        &config.fields,
        2025,
        FixedOffset::east_opt(0).unwrap(),
    );
    let options = DashboardOptions::from_config(&config).unwrap();

    assert!(commands::cmd_dashboard(&snapshot, &options, false).is_ok());
}

#[test]
fn test_cmd_dashboard_json() {
    let (snapshot, options) = setup_snapshot();
    assert!(commands::cmd_dashboard(&snapshot, &options, true).is_ok());
    assert!(commands::cmd_dashboard(&snapshot, &options, false).is_ok());
}

#[tokio::test]
async fn test_load_snapshot_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dashboard.json");
    std::fs::write(&path, DASHBOARD_JSON).unwrap();

    let source = SourceArgs {
        sources: vec![path.display().to_string()],
        year: Some(2024),
    };
    let (snapshot, options) = commands::load_snapshot(&Config::default(), &source)
        .await
        .unwrap();

    assert_eq!(options.year, 2024);
    assert_eq!(snapshot.deals.len(), 1);
}

#[tokio::test]
async fn test_load_snapshot_uses_config_sources() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dashboard.json");
    std::fs::write(&path, DASHBOARD_JSON).unwrap();

    let mut config = Config::default();
    config.sources = vec![path.display().to_string()];
    let (snapshot, _) = commands::load_snapshot(&config, &SourceArgs::default())
        .await
        .unwrap();

    assert_eq!(snapshot.deals.len(), 2);
}

#[tokio::test]
async fn test_load_snapshot_without_sources() {
    let result = commands::load_snapshot(&Config::default(), &SourceArgs::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_load_snapshot_invalid_year() {
    let source = SourceArgs {
        sources: vec!["unused.json".to_string()],
        year: Some(25),
    };
    let result = commands::load_snapshot(&Config::default(), &source).await;
    assert!(result.is_err());
}
