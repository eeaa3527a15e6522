use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type OrderId = i64;

/// Order status, encoded on the wire as `0` / `1` / `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OrderStatus {
    Received,
    Done,
    Canceled,
}

impl OrderStatus {
    pub fn code(self) -> u8 {
        match self {
            OrderStatus::Received => 0,
            OrderStatus::Done => 1,
            OrderStatus::Canceled => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Received)
    }
}

impl TryFrom<u8> for OrderStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OrderStatus::Received),
            1 => Ok(OrderStatus::Done),
            2 => Ok(OrderStatus::Canceled),
            other => Err(format!("unknown order status code {other}")),
        }
    }
}

impl From<OrderStatus> for u8 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub price: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// Σ price × quantity over the line items.
    pub fn total(&self) -> i64 {
        self.order_items
            .iter()
            .map(|item| item.price * item.quantity)
            .sum()
    }

    /// Local calendar day the order was created on.
    pub fn created_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// The backend sends zone-less `LocalDateTime` strings; offset-carrying
/// RFC 3339 values are accepted as well.
fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_created_at(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_created_at(raw: &str) -> Result<DateTime<Local>, String> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| format!("invalid createdAt '{trimmed}': {e}"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("createdAt '{trimmed}' does not exist in the local time zone"))
}

/// Dashboard tab. Each tab shows one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderTab {
    Received,
    Done,
    Canceled,
}

impl OrderTab {
    pub fn status(self) -> OrderStatus {
        match self {
            OrderTab::Received => OrderStatus::Received,
            OrderTab::Done => OrderStatus::Done,
            OrderTab::Canceled => OrderStatus::Canceled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderTab::Received => "received",
            OrderTab::Done => "done",
            OrderTab::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "received" => Ok(OrderTab::Received),
            "done" => Ok(OrderTab::Done),
            "canceled" => Ok(OrderTab::Canceled),
            other => Err(format!("unknown order type '{other}'")),
        }
    }
}

/// Which status action a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    Cancel,
    Complete,
}

impl OrderAction {
    /// Status the order moves to when the backend accepts the action.
    pub fn target_status(self) -> OrderStatus {
        match self {
            OrderAction::Cancel => OrderStatus::Canceled,
            OrderAction::Complete => OrderStatus::Done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderAction::Cancel => "cancel",
            OrderAction::Complete => "complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn order_parses_backend_payload() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "orderId": 5,
            "status": 2,
            "createdAt": "2024-06-01T18:30:00",
            "orderItems": [
                { "price": 1000, "quantity": 2 },
                { "price": 500, "quantity": 1 }
            ]
        }))
        .expect("order should parse");
        assert_eq!(order.order_id, 5);
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(
            order.created_day(),
            NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
        );
        assert_eq!(order.created_at.hour(), 18);
        assert_eq!(order.total(), 2500);
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        let err = serde_json::from_value::<Order>(serde_json::json!({
            "orderId": 1,
            "status": 7,
            "createdAt": "2024-06-01T10:00:00",
            "orderItems": []
        }))
        .expect_err("status 7 is not a valid order status");
        assert!(err.to_string().contains("unknown order status code 7"));
    }

    #[test]
    fn status_serializes_as_integer_code() {
        let json = serde_json::to_value(OrderStatus::Done).expect("serialize");
        assert_eq!(json, serde_json::json!(1));
    }

    #[test]
    fn created_at_accepts_fractional_seconds_and_offsets() {
        assert!(parse_created_at("2024-06-01T10:00:00.123456").is_ok());
        assert!(parse_created_at("2024-06-01T10:00:00+09:00").is_ok());
        assert!(parse_created_at("yesterday").is_err());
    }

    #[test]
    fn order_tab_parsing_is_strict() {
        assert_eq!("received".parse::<OrderTab>(), Ok(OrderTab::Received));
        assert_eq!("canceled".parse::<OrderTab>(), Ok(OrderTab::Canceled));
        assert!("cancelled".parse::<OrderTab>().is_err());
    }
}
