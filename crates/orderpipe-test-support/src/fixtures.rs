//! Canonical order fixtures.

use orderpipe_core::model::{Delivery, Item, Order, Payment};

/// A fully valid order with the canonical test payload values. The payment
/// timestamp matches `date_created`, so validating against a clock fixed
/// anywhere near 2021-11-26 passes.
#[must_use]
pub fn sample_order() -> Order {
    sample_order_with_uid("b563feb7b2b84b6test")
}

/// [`sample_order`] with a caller-chosen uid (the payment transaction id
/// follows the uid, as the producer assigns them).
#[must_use]
pub fn sample_order_with_uid(order_uid: &str) -> Order {
    Order {
        order_uid: order_uid.to_owned(),
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
            transaction: order_uid.to_owned(),
            request_id: String::new(),
            currency: "USD".to_owned(),
            provider: "wbpay".to_owned(),
            amount: 1817,
            payment_dt: 1_637_907_727,
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
        date_created: "2021-11-26T06:22:19Z".to_owned(),
        oof_shard: "1".to_owned(),
    }
}

/// [`sample_order`] serialized to its wire payload.
///
/// # Panics
///
/// Serialization of the fixture is infallible.
#[must_use]
pub fn sample_order_json() -> Vec<u8> {
    serde_json::to_vec(&sample_order()).expect("fixture serialization is infallible")
}
