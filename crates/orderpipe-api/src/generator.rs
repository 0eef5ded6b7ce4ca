//! Synthetic order generator.
//!
//! Publishes a mutating-uid synthetic order onto the bus at a fixed
//! interval. Useful for demos and soak tests of the full pipeline without a
//! real producer upstream.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use orderpipe_core::model::{Delivery, Item, Order, Payment};
use orderpipe_pipeline::memory::InMemoryBus;

/// Publishes synthetic orders forever at the given interval.
pub async fn run(bus: InMemoryBus, interval: Duration) {
    tracing::info!(?interval, "synthetic order generator started");
    let mut sequence: u64 = 1;
    loop {
        let order = synthetic_order(sequence);
        match serde_json::to_vec(&order) {
            Ok(payload) => {
                let marker = bus.publish(payload);
                tracing::debug!(
                    order_uid = %order.order_uid,
                    offset = marker.offset,
                    "synthetic order published"
                );
            }
            Err(err) => tracing::warn!(%err, "synthetic order serialization failed"),
        }
        sequence += 1;
        tokio::time::sleep(interval).await;
    }
}

/// Builds the nth synthetic order. Each carries a distinct uid (and matching
/// payment transaction) so downstream idempotency is exercised only on real
/// redelivery.
#[must_use]
pub fn synthetic_order(sequence: u64) -> Order {
    let order_uid = format!("b563feb7b2b84b6test{sequence}");
    Order {
        order_uid: order_uid.clone(),
        track_number: "WBILMTESTTRACK".to_owned(),
        entry: "WBIL".to_owned(),
        delivery: Delivery {
            name: "Test Testov".to_owned(),
            phone: "+98720000000".to_owned(),
            zip: "2639809".to_owned(),
            city: "Kiryat Mozkin".to_owned(),
            address: "Ploshad Mira 15".to_owned(),
            region: "Kraiot".to_owned(),
            email: "test@gmail.com".to_owned(),
        },
        payment: Payment {
            transaction: order_uid,
            request_id: String::new(),
            currency: "USD".to_owned(),
            provider: "wbpay".to_owned(),
            amount: 1817,
            payment_dt: Utc::now().timestamp(),
            bank: "alpha".to_owned(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![Item {
            chrt_id: 9_934_930,
            track_number: "WBILMTESTTRACK".to_owned(),
            price: 453,
            rid: "ab4219087a764ae0btest".to_owned(),
            name: "Mascaras".to_owned(),
            sale: 30,
            size: "0".to_owned(),
            total_price: 317,
            nm_id: 2_389_212,
            brand: "Vivienne Sabo".to_owned(),
            status: 202,
        }],
        locale: "en".to_owned(),
        internal_signature: String::new(),
        customer_id: "test".to_owned(),
        delivery_service: "meest".to_owned(),
        shardkey: "9".to_owned(),
        sm_id: 99,
        date_created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        oof_shard: "1".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use orderpipe_core::validation::validate;

    use super::*;

    #[test]
    fn test_synthetic_orders_pass_validation() {
        for sequence in 1..=3 {
            let order = synthetic_order(sequence);
            assert_eq!(validate(&order, Utc::now()), Ok(()));
        }
    }

    #[test]
    fn test_synthetic_order_uids_are_distinct() {
        let first = synthetic_order(1);
        let second = synthetic_order(2);

        assert_ne!(first.order_uid, second.order_uid);
        assert_eq!(first.payment.transaction, first.order_uid);
    }
}
