//! Business-rule validation for inbound orders.
//!
//! Pure and deterministic: the only input besides the order itself is the
//! caller-supplied check time, so boundary cases can be enumerated in tests
//! without fixtures. Checks run in a fixed precedence — root fields, then
//! delivery, then payment, then items — and return on the first failure.

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;

use crate::model::{Delivery, Item, Order, Payment};

/// Accepted currency codes.
pub const CURRENCIES: [&str; 2] = ["USD", "RUR"];
/// Accepted payment providers.
pub const PROVIDERS: [&str; 2] = ["wbpay", "other"];
/// Accepted banks.
pub const BANKS: [&str; 3] = ["alpha", "tbank", "sber"];

/// How far (in calendar years) a payment timestamp may sit from the check
/// time. One year of slack tolerates payments processed across a year
/// boundary while still rejecting garbage timestamps.
pub const PAYMENT_WINDOW_YEARS: i32 = 1;

/// A business-rule violation, carrying the offending field and reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("date_created is not a valid RFC 3339 timestamp: {0}")]
    BadDateCreated(String),

    #[error("phone must be '+' followed by exactly 11 digits, got {0:?}")]
    BadPhone(String),

    #[error("zip must be 5 to 7 digits, got {0:?}")]
    BadZip(String),

    #[error("currency {0:?} is not one of USD, RUR")]
    UnknownCurrency(String),

    #[error("provider {0:?} is not one of wbpay, other")]
    UnknownProvider(String),

    #[error("bank {0:?} is not one of alpha, tbank, sber")]
    UnknownBank(String),

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("payment_dt {0} is outside the accepted window around the check time")]
    PaymentOutsideWindow(i64),

    #[error("order has no items")]
    NoItems,

    #[error("item sale {0} must be between 0 and 100")]
    SaleOutOfRange(i64),
}

/// Checks an order against all business rules.
///
/// `now` is the processing time used for the payment-timestamp window.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, in the documented
/// precedence.
pub fn validate(order: &Order, now: DateTime<Utc>) -> Result<(), ValidationError> {
    validate_root(order)?;
    validate_delivery(&order.delivery)?;
    validate_payment(&order.payment, now)?;
    validate_items(&order.items)
}

fn validate_root(order: &Order) -> Result<(), ValidationError> {
    require("order_uid", &order.order_uid)?;
    require("track_number", &order.track_number)?;
    require("entry", &order.entry)?;
    require("locale", &order.locale)?;
    require("customer_id", &order.customer_id)?;
    require("delivery_service", &order.delivery_service)?;
    require("shardkey", &order.shardkey)?;
    require("date_created", &order.date_created)?;
    DateTime::parse_from_rfc3339(&order.date_created)
        .map_err(|err| ValidationError::BadDateCreated(err.to_string()))?;
    require("oof_shard", &order.oof_shard)?;
    Ok(())
}

fn validate_delivery(delivery: &Delivery) -> Result<(), ValidationError> {
    require("delivery.name", &delivery.name)?;
    validate_phone(&delivery.phone)?;
    validate_zip(&delivery.zip)?;
    require("delivery.city", &delivery.city)?;
    require("delivery.address", &delivery.address)?;
    require("delivery.region", &delivery.region)?;
    require("delivery.email", &delivery.email)?;
    Ok(())
}

fn validate_payment(payment: &Payment, now: DateTime<Utc>) -> Result<(), ValidationError> {
    require("payment.transaction", &payment.transaction)?;

    require("payment.currency", &payment.currency)?;
    if !CURRENCIES.contains(&payment.currency.as_str()) {
        return Err(ValidationError::UnknownCurrency(payment.currency.clone()));
    }

    require("payment.provider", &payment.provider)?;
    if !PROVIDERS.contains(&payment.provider.as_str()) {
        return Err(ValidationError::UnknownProvider(payment.provider.clone()));
    }

    if payment.amount <= 0 {
        return Err(ValidationError::NonPositive("payment.amount"));
    }

    validate_payment_time(payment.payment_dt, now)?;

    require("payment.bank", &payment.bank)?;
    if !BANKS.contains(&payment.bank.as_str()) {
        return Err(ValidationError::UnknownBank(payment.bank.clone()));
    }

    if payment.delivery_cost < 0 {
        return Err(ValidationError::Negative("payment.delivery_cost"));
    }
    if payment.goods_total <= 0 {
        return Err(ValidationError::NonPositive("payment.goods_total"));
    }
    if payment.custom_fee < 0 {
        return Err(ValidationError::Negative("payment.custom_fee"));
    }

    Ok(())
}

fn validate_payment_time(payment_dt: i64, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if payment_dt <= 0 {
        return Err(ValidationError::PaymentOutsideWindow(payment_dt));
    }
    let Some(paid_at) = DateTime::<Utc>::from_timestamp(payment_dt, 0) else {
        return Err(ValidationError::PaymentOutsideWindow(payment_dt));
    };
    if (paid_at.year() - now.year()).abs() > PAYMENT_WINDOW_YEARS {
        return Err(ValidationError::PaymentOutsideWindow(payment_dt));
    }
    Ok(())
}

fn validate_items(items: &[Item]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoItems);
    }

    for item in items {
        if item.chrt_id <= 0 {
            return Err(ValidationError::NonPositive("item.chrt_id"));
        }
        require("item.track_number", &item.track_number)?;
        if item.price <= 0 {
            return Err(ValidationError::NonPositive("item.price"));
        }
        require("item.rid", &item.rid)?;
        require("item.name", &item.name)?;
        if !(0..=100).contains(&item.sale) {
            return Err(ValidationError::SaleOutOfRange(item.sale));
        }
        require("item.size", &item.size)?;
        if item.total_price <= 0 {
            return Err(ValidationError::NonPositive("item.total_price"));
        }
        if item.nm_id <= 0 {
            return Err(ValidationError::NonPositive("item.nm_id"));
        }
        require("item.brand", &item.brand)?;
        if item.status < 0 {
            return Err(ValidationError::Negative("item.status"));
        }
    }

    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    match phone.strip_prefix('+') {
        Some(digits) if digits.len() == 11 && digits.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        _ => Err(ValidationError::BadPhone(phone.to_owned())),
    }
}

fn validate_zip(zip: &str) -> Result<(), ValidationError> {
    if (5..=7).contains(&zip.len()) && zip.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::BadZip(zip.to_owned()))
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn check_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 11, 26, 6, 30, 0).unwrap()
    }

    fn valid_order() -> Order {
        Order {
            order_uid: "b563feb7b2b84b6test".to_owned(),
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
                transaction: "b563feb7b2b84b6test".to_owned(),
                request_id: String::new(),
                currency: "USD".to_owned(),
                provider: "wbpay".to_owned(),
                amount: 1817,
                payment_dt: check_time().timestamp(),
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

    #[test]
    fn test_valid_order_passes() {
        assert_eq!(validate(&valid_order(), check_time()), Ok(()));
    }

    #[test]
    fn test_empty_order_uid_rejected() {
        let mut order = valid_order();
        order.order_uid = String::new();

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::EmptyField("order_uid"))
        );
    }

    #[test]
    fn test_optional_internal_signature_may_be_empty() {
        let mut order = valid_order();
        order.internal_signature = String::new();

        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_bad_date_created_rejected() {
        let mut order = valid_order();
        order.date_created = "26-11-2021".to_owned();

        assert!(matches!(
            validate(&order, check_time()),
            Err(ValidationError::BadDateCreated(_))
        ));
    }

    #[test]
    fn test_phone_with_ten_digits_rejected() {
        let mut order = valid_order();
        order.delivery.phone = "+1234567890".to_owned();

        assert!(matches!(
            validate(&order, check_time()),
            Err(ValidationError::BadPhone(_))
        ));
    }

    #[test]
    fn test_phone_with_eleven_digits_accepted() {
        let mut order = valid_order();
        order.delivery.phone = "+12345678901".to_owned();

        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_phone_without_plus_rejected() {
        let mut order = valid_order();
        order.delivery.phone = "12345678901".to_owned();

        assert!(matches!(
            validate(&order, check_time()),
            Err(ValidationError::BadPhone(_))
        ));
    }

    #[test]
    fn test_phone_with_letter_rejected() {
        let mut order = valid_order();
        order.delivery.phone = "+1234567890a".to_owned();

        assert!(matches!(
            validate(&order, check_time()),
            Err(ValidationError::BadPhone(_))
        ));
    }

    #[test]
    fn test_zip_with_four_digits_rejected() {
        let mut order = valid_order();
        order.delivery.zip = "1234".to_owned();

        assert!(matches!(
            validate(&order, check_time()),
            Err(ValidationError::BadZip(_))
        ));
    }

    #[test]
    fn test_zip_with_five_digits_accepted() {
        let mut order = valid_order();
        order.delivery.zip = "12345".to_owned();

        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_zip_with_seven_digits_accepted() {
        let mut order = valid_order();
        order.delivery.zip = "1234567".to_owned();

        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_zip_with_eight_digits_rejected() {
        let mut order = valid_order();
        order.delivery.zip = "12345678".to_owned();

        assert!(matches!(
            validate(&order, check_time()),
            Err(ValidationError::BadZip(_))
        ));
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let mut order = valid_order();
        order.payment.currency = "EUR".to_owned();

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::UnknownCurrency("EUR".to_owned()))
        );
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut order = valid_order();
        order.payment.provider = "paypal".to_owned();

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::UnknownProvider("paypal".to_owned()))
        );
    }

    #[test]
    fn test_unknown_bank_rejected() {
        let mut order = valid_order();
        order.payment.bank = "hsbc".to_owned();

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::UnknownBank("hsbc".to_owned()))
        );
    }

    #[test]
    fn test_zero_amount_rejected_one_accepted() {
        let mut order = valid_order();
        order.payment.amount = 0;
        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::NonPositive("payment.amount"))
        );

        order.payment.amount = 1;
        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_negative_delivery_cost_rejected_zero_accepted() {
        let mut order = valid_order();
        order.payment.delivery_cost = -1;
        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::Negative("payment.delivery_cost"))
        );

        order.payment.delivery_cost = 0;
        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_payment_time_in_previous_year_accepted() {
        let mut order = valid_order();
        order.payment.payment_dt = Utc
            .with_ymd_and_hms(2020, 12, 31, 23, 59, 0)
            .unwrap()
            .timestamp();

        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_payment_time_two_years_back_rejected() {
        let mut order = valid_order();
        let stamp = Utc
            .with_ymd_and_hms(2019, 6, 1, 0, 0, 0)
            .unwrap()
            .timestamp();
        order.payment.payment_dt = stamp;

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::PaymentOutsideWindow(stamp))
        );
    }

    #[test]
    fn test_zero_payment_time_rejected() {
        let mut order = valid_order();
        order.payment.payment_dt = 0;

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::PaymentOutsideWindow(0))
        );
    }

    #[test]
    fn test_empty_item_list_rejected() {
        let mut order = valid_order();
        order.items.clear();

        assert_eq!(validate(&order, check_time()), Err(ValidationError::NoItems));
    }

    #[test]
    fn test_sale_above_hundred_rejected() {
        let mut order = valid_order();
        order.items[0].sale = 101;

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::SaleOutOfRange(101))
        );
    }

    #[test]
    fn test_negative_sale_rejected() {
        let mut order = valid_order();
        order.items[0].sale = -1;

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::SaleOutOfRange(-1))
        );
    }

    #[test]
    fn test_sale_boundaries_accepted() {
        let mut order = valid_order();
        order.items[0].sale = 0;
        assert_eq!(validate(&order, check_time()), Ok(()));

        order.items[0].sale = 100;
        assert_eq!(validate(&order, check_time()), Ok(()));
    }

    #[test]
    fn test_second_invalid_item_rejected() {
        let mut order = valid_order();
        let mut broken = order.items[0].clone();
        broken.rid = "second-line".to_owned();
        broken.nm_id = 0;
        order.items.push(broken);

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::NonPositive("item.nm_id"))
        );
    }

    #[test]
    fn test_first_failure_wins_over_later_ones() {
        // Both the root and the payment are broken; the root check runs first.
        let mut order = valid_order();
        order.entry = String::new();
        order.payment.amount = 0;

        assert_eq!(
            validate(&order, check_time()),
            Err(ValidationError::EmptyField("entry"))
        );
    }
}
