use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::warn;

use super::model::{Order, OrderId};
use crate::api::ApiClient;
use crate::error::ApiError;

/// Remote source of a store's orders and of the seller's confirmation
/// setting. The dashboard only talks to the backend through this trait.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn fetch_orders(&self, store_id: i64) -> Result<Vec<Order>, ApiError>;

    /// `true` when the seller wants two clicks before cancel/complete commit.
    async fn fetch_double_click_setting(&self, login_id: &str) -> Result<bool, ApiError>;

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), ApiError>;

    async fn complete_order(&self, order_id: OrderId) -> Result<(), ApiError>;
}

/// Decode the order rows one by one. A row that does not parse (unknown
/// status code, bad timestamp) is skipped so the rest of the list survives.
fn decode_orders(store_id: i64, rows: Vec<Value>) -> Vec<Order> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<Order>(row.clone()) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(
                    store_id,
                    order_id = ?row.get("orderId"),
                    error = %e,
                    "skipping unreadable order row"
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl OrderBackend for ApiClient {
    async fn fetch_orders(&self, store_id: i64) -> Result<Vec<Order>, ApiError> {
        let rows: Vec<Value> = self.get_json(&format!("/api/orders/{store_id}")).await?;
        Ok(decode_orders(store_id, rows))
    }

    async fn fetch_double_click_setting(&self, login_id: &str) -> Result<bool, ApiError> {
        self.get_json(&format!("/api/sellers/{login_id}/count-setting"))
            .await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), ApiError> {
        self.send_empty(Method::PUT, &format!("/api/orders/{order_id}/cancel"))
            .await
    }

    async fn complete_order(&self, order_id: OrderId) -> Result<(), ApiError> {
        self.send_empty(Method::PUT, &format!("/api/orders/{order_id}/complete"))
            .await
    }
}
