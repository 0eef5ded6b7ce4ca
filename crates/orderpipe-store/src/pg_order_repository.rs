//! `PostgreSQL` implementation of the `OrderRepository` port.
//!
//! One order persists as one transaction across five tables, every statement
//! `ON CONFLICT ... DO NOTHING` so a redelivered message re-applies as a
//! silent no-op. Reads join the five tables back into aggregates, items
//! ordered by catalog id then rid.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::PgPool;

use orderpipe_core::error::OrderError;
use orderpipe_core::model::{Delivery, Item, Order, Payment};
use orderpipe_core::repository::OrderRepository;

const INSERT_ORDER: &str = "
INSERT INTO orders (
    order_uid, track_number, entry, locale, internal_signature,
    customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (order_uid) DO NOTHING
";

const INSERT_DELIVERY: &str = "
INSERT INTO delivery (order_uid, name, phone, zip, city, address, region, email)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (order_uid) DO NOTHING
";

const INSERT_PAYMENT: &str = "
INSERT INTO payment (
    order_uid, transaction, request_id, currency, provider,
    amount, payment_dt, bank, delivery_cost, goods_total, custom_fee
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (order_uid) DO NOTHING
";

const INSERT_ITEM: &str = "
INSERT INTO items (chrt_id, name, size, nm_id, brand)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (chrt_id) DO NOTHING
";

const INSERT_ORDER_ITEM: &str = "
INSERT INTO order_items (
    order_uid, chrt_id, track_number, price, sale, total_price, rid, status
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (order_uid, chrt_id, rid) DO NOTHING
";

const SELECT_ORDER_BY_UID: &str = "
SELECT
    o.order_uid,
    o.track_number,
    o.entry,
    o.locale,
    o.internal_signature,
    o.customer_id,
    o.delivery_service,
    o.shardkey,
    o.sm_id,
    o.date_created,
    o.oof_shard,
    d.name AS delivery_name,
    d.phone AS delivery_phone,
    d.zip AS delivery_zip,
    d.city AS delivery_city,
    d.address AS delivery_address,
    d.region AS delivery_region,
    d.email AS delivery_email,
    p.transaction,
    p.request_id,
    p.currency,
    p.provider,
    p.amount,
    p.payment_dt,
    p.bank,
    p.delivery_cost,
    p.goods_total,
    p.custom_fee,
    oi.chrt_id,
    i.name AS item_name,
    i.size AS item_size,
    i.nm_id,
    i.brand,
    oi.track_number AS item_track_number,
    oi.price,
    oi.sale,
    oi.total_price AS item_total_price,
    oi.rid,
    oi.status
FROM orders o
LEFT JOIN delivery d ON o.order_uid = d.order_uid
LEFT JOIN payment p ON o.order_uid = p.order_uid
LEFT JOIN order_items oi ON o.order_uid = oi.order_uid
LEFT JOIN items i ON oi.chrt_id = i.chrt_id
WHERE o.order_uid = $1
ORDER BY oi.chrt_id, oi.rid
";

const SELECT_ALL_ORDERS: &str = "
SELECT
    o.order_uid,
    o.track_number,
    o.entry,
    o.locale,
    o.internal_signature,
    o.customer_id,
    o.delivery_service,
    o.shardkey,
    o.sm_id,
    o.date_created,
    o.oof_shard,
    d.name AS delivery_name,
    d.phone AS delivery_phone,
    d.zip AS delivery_zip,
    d.city AS delivery_city,
    d.address AS delivery_address,
    d.region AS delivery_region,
    d.email AS delivery_email,
    p.transaction,
    p.request_id,
    p.currency,
    p.provider,
    p.amount,
    p.payment_dt,
    p.bank,
    p.delivery_cost,
    p.goods_total,
    p.custom_fee,
    oi.chrt_id,
    i.name AS item_name,
    i.size AS item_size,
    i.nm_id,
    i.brand,
    oi.track_number AS item_track_number,
    oi.price,
    oi.sale,
    oi.total_price AS item_total_price,
    oi.rid,
    oi.status
FROM orders o
LEFT JOIN delivery d ON o.order_uid = d.order_uid
LEFT JOIN payment p ON o.order_uid = p.order_uid
LEFT JOIN order_items oi ON o.order_uid = oi.order_uid
LEFT JOIN items i ON oi.chrt_id = i.chrt_id
ORDER BY o.order_uid, oi.chrt_id, oi.rid
";

/// `PostgreSQL`-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new `PgOrderRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One row of the joined order graph. Delivery, payment, and item columns
/// come from LEFT JOINs and are nullable.
#[derive(Debug, sqlx::FromRow)]
struct JoinedOrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: Option<String>,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: DateTime<Utc>,
    oof_shard: String,
    delivery_name: Option<String>,
    delivery_phone: Option<String>,
    delivery_zip: Option<String>,
    delivery_city: Option<String>,
    delivery_address: Option<String>,
    delivery_region: Option<String>,
    delivery_email: Option<String>,
    transaction: Option<String>,
    request_id: Option<String>,
    currency: Option<String>,
    provider: Option<String>,
    amount: Option<i64>,
    payment_dt: Option<DateTime<Utc>>,
    bank: Option<String>,
    delivery_cost: Option<i64>,
    goods_total: Option<i64>,
    custom_fee: Option<i64>,
    chrt_id: Option<i64>,
    item_name: Option<String>,
    item_size: Option<String>,
    nm_id: Option<i64>,
    brand: Option<String>,
    item_track_number: Option<String>,
    price: Option<i64>,
    sale: Option<i64>,
    item_total_price: Option<i64>,
    rid: Option<String>,
    status: Option<i64>,
}

/// Aggregate under reconstruction while folding joined rows.
struct PartialAggregate {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: DateTime<Utc>,
    oof_shard: String,
    delivery: Option<Delivery>,
    payment: Option<Payment>,
    items: Vec<Item>,
}

impl PartialAggregate {
    fn from_row(row: &JoinedOrderRow) -> Self {
        Self {
            order_uid: row.order_uid.clone(),
            track_number: row.track_number.clone(),
            entry: row.entry.clone(),
            locale: row.locale.clone(),
            internal_signature: row.internal_signature.clone().unwrap_or_default(),
            customer_id: row.customer_id.clone(),
            delivery_service: row.delivery_service.clone(),
            shardkey: row.shardkey.clone(),
            sm_id: row.sm_id,
            date_created: row.date_created,
            oof_shard: row.oof_shard.clone(),
            delivery: delivery_from_row(row),
            payment: payment_from_row(row),
            items: Vec::new(),
        }
    }

    fn finalize(self) -> Result<Order, OrderError> {
        let uid = &self.order_uid;
        let delivery = self
            .delivery
            .ok_or_else(|| OrderError::Integrity(format!("order {uid} has no delivery row")))?;
        let payment = self
            .payment
            .ok_or_else(|| OrderError::Integrity(format!("order {uid} has no payment row")))?;
        if self.items.is_empty() {
            return Err(OrderError::Integrity(format!(
                "order {uid} has no item rows"
            )));
        }
        Ok(Order {
            order_uid: self.order_uid,
            track_number: self.track_number,
            entry: self.entry,
            delivery,
            payment,
            items: self.items,
            locale: self.locale,
            internal_signature: self.internal_signature,
            customer_id: self.customer_id,
            delivery_service: self.delivery_service,
            shardkey: self.shardkey,
            sm_id: self.sm_id,
            date_created: self
                .date_created
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            oof_shard: self.oof_shard,
        })
    }
}

fn delivery_from_row(row: &JoinedOrderRow) -> Option<Delivery> {
    row.delivery_name.as_ref()?;
    Some(Delivery {
        name: row.delivery_name.clone().unwrap_or_default(),
        phone: row.delivery_phone.clone().unwrap_or_default(),
        zip: row.delivery_zip.clone().unwrap_or_default(),
        city: row.delivery_city.clone().unwrap_or_default(),
        address: row.delivery_address.clone().unwrap_or_default(),
        region: row.delivery_region.clone().unwrap_or_default(),
        email: row.delivery_email.clone().unwrap_or_default(),
    })
}

fn payment_from_row(row: &JoinedOrderRow) -> Option<Payment> {
    row.transaction.as_ref()?;
    Some(Payment {
        transaction: row.transaction.clone().unwrap_or_default(),
        request_id: row.request_id.clone().unwrap_or_default(),
        currency: row.currency.clone().unwrap_or_default(),
        provider: row.provider.clone().unwrap_or_default(),
        amount: row.amount.unwrap_or_default(),
        payment_dt: row.payment_dt.map(|dt| dt.timestamp()).unwrap_or_default(),
        bank: row.bank.clone().unwrap_or_default(),
        delivery_cost: row.delivery_cost.unwrap_or_default(),
        goods_total: row.goods_total.unwrap_or_default(),
        custom_fee: row.custom_fee.unwrap_or_default(),
    })
}

fn item_from_row(row: &JoinedOrderRow) -> Option<Item> {
    let chrt_id = row.chrt_id?;
    Some(Item {
        chrt_id,
        track_number: row.item_track_number.clone().unwrap_or_default(),
        price: row.price.unwrap_or_default(),
        rid: row.rid.clone().unwrap_or_default(),
        name: row.item_name.clone().unwrap_or_default(),
        sale: row.sale.unwrap_or_default(),
        size: row.item_size.clone().unwrap_or_default(),
        total_price: row.item_total_price.unwrap_or_default(),
        nm_id: row.nm_id.unwrap_or_default(),
        brand: row.brand.clone().unwrap_or_default(),
        status: row.status.unwrap_or_default(),
    })
}

/// Folds joined rows into per-uid partial aggregates. Rows arrive sorted by
/// uid, so aggregates come out in uid order.
fn fold_rows(rows: Vec<JoinedOrderRow>) -> Vec<PartialAggregate> {
    let mut aggregates: Vec<PartialAggregate> = Vec::new();
    for row in rows {
        if aggregates.last().is_none_or(|a| a.order_uid != row.order_uid) {
            aggregates.push(PartialAggregate::from_row(&row));
        }
        if let (Some(item), Some(aggregate)) = (item_from_row(&row), aggregates.last_mut()) {
            aggregate.items.push(item);
        }
    }
    aggregates
}

fn persistence(err: sqlx::Error) -> OrderError {
    OrderError::Persistence(err.to_string())
}

fn parse_date_created(order: &Order) -> Result<DateTime<Utc>, OrderError> {
    DateTime::parse_from_rfc3339(&order.date_created)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            OrderError::Persistence(format!(
                "order {} date_created is not RFC 3339: {err}",
                order.order_uid
            ))
        })
}

fn payment_timestamp(order: &Order) -> Result<DateTime<Utc>, OrderError> {
    DateTime::from_timestamp(order.payment.payment_dt, 0).ok_or_else(|| {
        OrderError::Persistence(format!(
            "order {} payment_dt {} is out of range",
            order.order_uid, order.payment.payment_dt
        ))
    })
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn persist(&self, order: &Order) -> Result<(), OrderError> {
        let date_created = parse_date_created(order)?;
        let payment_dt = payment_timestamp(order)?;

        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query(INSERT_ORDER)
            .bind(&order.order_uid)
            .bind(&order.track_number)
            .bind(&order.entry)
            .bind(&order.locale)
            .bind(&order.internal_signature)
            .bind(&order.customer_id)
            .bind(&order.delivery_service)
            .bind(&order.shardkey)
            .bind(order.sm_id)
            .bind(date_created)
            .bind(&order.oof_shard)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        sqlx::query(INSERT_DELIVERY)
            .bind(&order.order_uid)
            .bind(&order.delivery.name)
            .bind(&order.delivery.phone)
            .bind(&order.delivery.zip)
            .bind(&order.delivery.city)
            .bind(&order.delivery.address)
            .bind(&order.delivery.region)
            .bind(&order.delivery.email)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        sqlx::query(INSERT_PAYMENT)
            .bind(&order.order_uid)
            .bind(&order.payment.transaction)
            .bind(&order.payment.request_id)
            .bind(&order.payment.currency)
            .bind(&order.payment.provider)
            .bind(order.payment.amount)
            .bind(payment_dt)
            .bind(&order.payment.bank)
            .bind(order.payment.delivery_cost)
            .bind(order.payment.goods_total)
            .bind(order.payment.custom_fee)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        for item in &order.items {
            sqlx::query(INSERT_ITEM)
                .bind(item.chrt_id)
                .bind(&item.name)
                .bind(&item.size)
                .bind(item.nm_id)
                .bind(&item.brand)
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;

            sqlx::query(INSERT_ORDER_ITEM)
                .bind(&order.order_uid)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(item.sale)
                .bind(item.total_price)
                .bind(&item.rid)
                .bind(item.status)
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)
    }

    async fn load_by_uid(&self, order_uid: &str) -> Result<Order, OrderError> {
        let rows: Vec<JoinedOrderRow> = sqlx::query_as(SELECT_ORDER_BY_UID)
            .bind(order_uid)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        if rows.is_empty() {
            return Err(OrderError::NotFound(order_uid.to_owned()));
        }

        let mut aggregates = fold_rows(rows);
        // The query filters on one uid; exactly one aggregate comes back.
        aggregates
            .pop()
            .ok_or_else(|| OrderError::NotFound(order_uid.to_owned()))?
            .finalize()
    }

    async fn load_all(&self) -> Result<Vec<Order>, OrderError> {
        let rows: Vec<JoinedOrderRow> = sqlx::query_as(SELECT_ALL_ORDERS)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        let mut orders = Vec::new();
        for aggregate in fold_rows(rows) {
            match aggregate.finalize() {
                Ok(order) => orders.push(order),
                // One corrupt aggregate must not poison the warm load.
                Err(err) => tracing::warn!(%err, "skipping incomplete stored order"),
            }
        }
        Ok(orders)
    }
}
