//! Integration tests for dealbook-core
//!
//! These tests exercise the full workbook → export → dashboard workflow and
//! the HTTP paths (webhook push, remote documents) against a mock server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{TimeZone, Utc};
use dealbook_core::{
    dataset::{load_source, Dataset, Snapshot},
    export::{
        export_sheet, send_to_webhook, ExportOptions, LocalDirectory, WebhookPayload, Workbook,
        DEALS_SHEET, PAYMENTS_SHEET,
    },
    Config, DashboardOptions, DashboardReport, Error,
};
use tempfile::TempDir;
use tokio::sync::oneshot;

fn deals_csv() -> &'static str {
    "Покупатель,Продукт,Базис,Регион закупки,Объем продажи,\"Сумма, тыс. CNY\",\"Цена продажи, тыс. CNY\",Дата подтверждения сделки,\n\
     Acme,Лён,FCA,Алтай,100,500,5,2025-03-10,x\n\
     Globex,Рапс,CPT,Омск,300,900,3,2025-01-15,y\n\
     Acme,Рапс,FCA,Омск,50,1000,4,2025-03-20,z\n\
     Initech,Лён,FCA,Алтай,999,999,1,2024-12-31,old\n"
}

fn payments_csv() -> &'static str {
    "Покупатель,\"Сумма поступления в cny\n(Самойленко)\",Статус оплаты,Форма оплаты,Дата отправки документов,Дата поступления средств\n\
     Acme,100,оплачено,Аккредитив (подтвержденный),2025-01-01,2025-01-11\n\
     Globex,50,не оплачено,аванс,,\n\
     Acme,30,оплачено,CAD,2025-02-01,2025-02-05\n"
}

fn workbook() -> (TempDir, Workbook) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(format!("{}.csv", DEALS_SHEET)), deals_csv()).unwrap();
    std::fs::write(dir.path().join(format!("{}.csv", PAYMENTS_SHEET)), payments_csv()).unwrap();
    let workbook = Workbook::new(dir.path());
    (dir, workbook)
}

fn utc_config() -> Config {
    Config {
        utc_offset: "+00:00".to_string(),
        ..Config::default()
    }
}

// =============================================================================
// Export → Dashboard
// =============================================================================

#[tokio::test]
async fn test_export_then_dashboard() {
    let (_sheets, workbook) = workbook();
    let out = TempDir::new().unwrap();
    let destination = LocalDirectory::new(out.path()).unwrap();
    let config = utc_config();
    let now = Utc.with_ymd_and_hms(2025, 12, 25, 10, 0, 0).unwrap();

    let deals = export_sheet(
        &workbook,
        DEALS_SHEET,
        &ExportOptions::deals(),
        &config.fields.payments,
        &destination,
        now,
    )
    .expect("Failed to export deals");
    assert_eq!(deals.total, 4);
    assert!(deals.location.ends_with("Итоги_года_2025-12-25.json"));

    let payments = export_sheet(
        &workbook,
        PAYMENTS_SHEET,
        &ExportOptions::payments_with_stats(),
        &config.fields.payments,
        &destination,
        now,
    )
    .expect("Failed to export payments");
    assert_eq!(payments.exported, 3);
    assert!(payments.location.ends_with("payments_with_stats_2025-12-25.json"));

    let snapshot = Snapshot::load(&[deals.location, payments.location], &config)
        .await
        .expect("Failed to load snapshot");
    assert_eq!(snapshot.deals.len(), 3);
    assert_eq!(snapshot.payments.len(), 3);

    let options = DashboardOptions::from_config(&config).unwrap();
    let report = DashboardReport::build(&snapshot, &options);

    assert_eq!(report.hero.total_deals, 3);
    assert_eq!(report.hero.total_volume, 450.0);
    assert_eq!(report.top_clients[0].name, "Globex");
    assert_eq!(report.final_stats.unique_buyers, 2);
    assert_eq!(report.basis[0].key, "CPT");
    assert_eq!(report.timeline.len(), 2);

    assert_eq!(report.payments.paid.count, 2);
    assert_eq!(report.payments.paid.amount, 130.0);
    assert_eq!(report.payments.turnaround.overall.average_days, Some(7.0));
    let lc = report
        .payments
        .turnaround
        .by_payment_type
        .iter()
        .find(|t| t.key == "аккредитив")
        .unwrap();
    assert_eq!(lc.average_days, Some(10.0));
}

#[test]
fn test_paid_only_export() {
    let (_sheets, workbook) = workbook();
    let out = TempDir::new().unwrap();
    let destination = LocalDirectory::new(out.path()).unwrap();
    let config = Config::default();

    let outcome = export_sheet(
        &workbook,
        PAYMENTS_SHEET,
        &ExportOptions::paid_only(),
        &config.fields.payments,
        &destination,
        Utc::now(),
    )
    .unwrap();
    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.exported, 2);

    let dataset = Dataset::from_file(std::path::Path::new(&outcome.location)).unwrap();
    // A bare array reads back as deals
    assert_eq!(dataset.deals.len(), 2);
}

#[test]
fn test_missing_sheet_is_reported() {
    let (_sheets, workbook) = workbook();
    let out = TempDir::new().unwrap();
    let destination = LocalDirectory::new(out.path()).unwrap();

    let err = export_sheet(
        &workbook,
        "Нет такого",
        &ExportOptions::deals(),
        &Config::default().fields.payments,
        &destination,
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::SheetNotFound(_)));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

// =============================================================================
// HTTP
// =============================================================================

type Received = Arc<Mutex<Vec<WebhookPayload>>>;

struct MockServer {
    addr: SocketAddr,
    received: Received,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    async fn start() -> Self {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/hook", post(handle_hook))
            .route("/broken", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/deals.json", get(handle_document))
            .route("/missing.json", get(|| async { StatusCode::NOT_FOUND }))
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            received,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle_hook(State(received): State<Received>, Json(payload): Json<WebhookPayload>) -> StatusCode {
    received.lock().unwrap().push(payload);
    StatusCode::OK
}

async fn handle_document() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "timestamp": "2025-12-25T10:00:00.000Z",
        "dataCount": 1,
        "data": [{"Покупатель": "Acme", "Дата подтверждения сделки": "2025-05-05"}]
    }))
}

#[tokio::test]
async fn test_push_to_webhook() {
    let server = MockServer::start().await;
    let (_sheets, workbook) = workbook();
    let data = workbook.sheet(DEALS_SHEET).unwrap().read(Some(52)).unwrap();

    let status = send_to_webhook(&server.url("/hook"), &data.records).await.unwrap();
    assert_eq!(status, 200);

    let received = server.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].data_count, 4);
    assert_eq!(received[0].data[0].text("Покупатель").as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_webhook_error_status_is_returned() {
    let server = MockServer::start().await;
    let status = send_to_webhook(&server.url("/broken"), &[]).await.unwrap();
    assert_eq!(status, 500);
}

#[tokio::test]
async fn test_remote_sources() {
    let server = MockServer::start().await;

    let dataset = load_source(&server.url("/deals.json")).await.unwrap();
    assert_eq!(dataset.deals.len(), 1);

    let err = Snapshot::load(
        &[server.url("/deals.json"), server.url("/missing.json")],
        &Config::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}
