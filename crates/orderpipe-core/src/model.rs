//! The order aggregate and its nested value types.
//!
//! Field names mirror the inbound JSON contract exactly. Every container
//! carries `#[serde(default)]` so that a *missing* field decodes to its empty
//! value and is rejected by validation with a precise reason, instead of
//! failing the whole payload at decode time. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Root aggregate, identified by `order_uid`.
///
/// The uid is assigned by the producer of the inbound event, is globally
/// unique, and never changes after creation. An order owns exactly one
/// [`Delivery`], one [`Payment`], and at least one [`Item`] once validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    /// Producer-assigned unique identifier.
    pub order_uid: String,
    pub track_number: String,
    /// Entry channel code.
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    /// Line entries; never empty for a validated order.
    pub items: Vec<Item>,
    pub locale: String,
    /// Optional; empty when the producer did not sign the message.
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    /// RFC 3339 creation timestamp. Kept textual so a malformed value is a
    /// validation rejection rather than a decode failure.
    pub date_created: String,
    pub oof_shard: String,
}

/// Delivery details, 1:1 with the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    /// `+` followed by exactly 11 digits.
    pub phone: String,
    /// 5 to 7 digits.
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details, 1:1 with the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    /// Optional; empty when the payment had no separate request.
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix seconds.
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// One line entry of an order.
///
/// `chrt_id` identifies a catalog entry shared across orders; the remaining
/// price/sale/status fields are private to this order's line, keyed by `rid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    /// Unique per order-item line.
    pub rid: String,
    pub name: String,
    /// Percentage, 0 to 100.
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    /// Open-ended status code domain; only the sign is constrained.
    pub status: i64,
}
