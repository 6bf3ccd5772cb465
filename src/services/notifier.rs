use serde_json::json;
use uuid::Uuid;

use crate::models::Order;

/// Webhook notification service for the email/notification collaborator.
/// Fire-and-forget: failures are logged but never block or roll back a
/// state change.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// POST an event to the webhook. Failures are logged as warnings.
    async fn send(&self, event: &str, payload: serde_json::Value) {
        let body = json!({
            "event": event,
            "payload": payload,
        });

        match self.http.post(&self.webhook_url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        event,
                        status = %resp.status(),
                        "Notification webhook returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(event, error = %e, "Failed to deliver notification");
            }
        }
    }

    pub async fn order_created(&self, order: &Order, ledger_pending: bool) {
        self.send(
            "order.created",
            json!({
                "order_id": order.id,
                "user_id": order.user_id,
                "total": order.total,
                "ledger_pending": ledger_pending,
            }),
        )
        .await;
    }

    pub async fn order_cancelled(&self, order: &Order, rider_compensation: i64) {
        self.send(
            "order.cancelled",
            json!({
                "order_id": order.id,
                "shipping_status": order.shipping_status,
                "rider_compensation": rider_compensation,
            }),
        )
        .await;
    }

    pub async fn order_delivered(&self, order_id: Uuid) {
        self.send("order.delivered", json!({ "order_id": order_id }))
            .await;
    }

    pub async fn settlement_successful(&self, transaction_id: Uuid) {
        self.send(
            "settlement.successful",
            json!({ "transaction_id": transaction_id }),
        )
        .await;
    }
}
