//! Pushing records to a webhook

use serde::{Deserialize, Serialize};
use tracing::info;

use super::iso_timestamp;
use crate::error::Result;
use crate::record::Record;

/// Body POSTed to the webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub timestamp: String,
    pub data_count: usize,
    pub data: Vec<Record>,
}

impl WebhookPayload {
    pub fn new(records: &[Record]) -> Self {
        Self {
            timestamp: iso_timestamp(chrono::Utc::now()),
            data_count: records.len(),
            data: records.to_vec(),
        }
    }
}

/// POST the records as JSON and return the response status code
///
/// Non-2xx statuses are returned, not raised; transport failures are errors.
pub async fn send_to_webhook(url: &str, records: &[Record]) -> Result<u16> {
    let payload = WebhookPayload::new(records);
    let response = reqwest::Client::new().post(url).json(&payload).send().await?;
    let status = response.status().as_u16();

    info!("Sent {} records to webhook, status {}", payload.data_count, status);
    Ok(status)
}
