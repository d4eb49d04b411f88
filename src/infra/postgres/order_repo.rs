use {
    crate::domain::{
        error::PaymentError,
        id::IncrementId,
        money::{Amount, CurrencyCode, Money},
        order::{
            Capture, CaptureResult, Customer, HistoryComment, Invoice, NewOrder, Order,
            OrderPayment, OrderState, SecureArea,
        },
    },
    sqlx::{PgExecutor, PgPool},
    uuid::Uuid,
};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    increment_id: String,
    state: String,
    customer_id: Option<String>,
    customer_name: String,
    customer_email: String,
    grand_total: String,
    currency: String,
    email_sent: bool,
    payment_transaction_id: Option<String>,
    payment_currency: Option<String>,
    payment_amount_captured: Option<String>,
    payment_parent_closed: bool,
}

impl TryFrom<OrderRow> for Order {
    type Error = PaymentError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            increment_id: IncrementId::new(row.increment_id)?,
            state: OrderState::try_from(row.state.as_str())?,
            customer: Customer {
                id: row.customer_id,
                name: row.customer_name,
                email: row.customer_email,
            },
            grand_total: Money::new(Amount::new(row.grand_total)?, CurrencyCode::new(row.currency)?),
            email_sent: row.email_sent,
            payment: OrderPayment {
                transaction_id: row.payment_transaction_id,
                currency_code: row.payment_currency,
                amount_captured: row.payment_amount_captured,
                parent_transaction_closed: row.payment_parent_closed,
            },
        })
    }
}

/// Place an order with its pending authorization transaction.
pub async fn insert_order(pool: &PgPool, order: &NewOrder) -> Result<(), PaymentError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO sales_orders
            (id, increment_id, customer_id, customer_name, customer_email, grand_total, currency)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(order.id)
    .bind(order.increment_id.as_str())
    .bind(order.customer.id.as_deref())
    .bind(&order.customer.name)
    .bind(&order.customer.email)
    .bind(order.grand_total.amount().as_str())
    .bind(order.grand_total.currency().as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO payment_transactions (id, order_id, txn_id, txn_type, amount, currency)
        VALUES ($1, $2, $3, 'authorization', $4, $5)
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(order.id)
    .bind(format!("auth-{}", order.increment_id))
    .bind(order.grand_total.amount().as_str())
    .bind(order.grand_total.currency().as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn find_by_increment_id<'e, E: PgExecutor<'e>>(
    executor: E,
    increment_id: &IncrementId,
) -> Result<Option<Order>, PaymentError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT id, increment_id, state, customer_id, customer_name, customer_email,
               grand_total, currency, email_sent, payment_transaction_id,
               payment_currency, payment_amount_captured, payment_parent_closed
        FROM sales_orders
        WHERE increment_id = $1
        "#,
    )
    .bind(increment_id.as_str())
    .fetch_optional(executor)
    .await?;

    row.map(Order::try_from).transpose()
}

pub async fn add_history(
    tx: &mut Tx<'_>,
    order_id: Uuid,
    entry: &HistoryComment,
) -> Result<(), PaymentError> {
    sqlx::query(
        r#"
        INSERT INTO order_status_history (id, order_id, comment, status, is_customer_notified)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(&entry.comment)
    .bind(entry.status.map(|s| s.as_str()))
    .bind(entry.is_customer_notified)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_state(
    tx: &mut Tx<'_>,
    order_id: Uuid,
    state: OrderState,
) -> Result<(), PaymentError> {
    sqlx::query("UPDATE sales_orders SET state = $1, updated_at = now() WHERE id = $2")
        .bind(state.as_str())
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Register a capture notification for the order's payment.
///
/// An order is captured at most once: the payment columns are only written
/// while `payment_transaction_id` is still empty, whatever transaction id
/// the notification carries.
pub async fn register_capture(
    tx: &mut Tx<'_>,
    order: &Order,
    capture: &Capture,
) -> Result<CaptureResult, PaymentError> {
    let updated = sqlx::query(
        r#"
        UPDATE sales_orders
        SET payment_transaction_id = $1, payment_currency = $2,
            payment_amount_captured = $3, payment_parent_closed = true,
            state = $4, updated_at = now()
        WHERE id = $5 AND payment_transaction_id IS NULL
        "#,
    )
    .bind(&capture.transaction_id)
    .bind(capture.money.currency().as_str())
    .bind(capture.money.amount().as_str())
    .bind(OrderState::Processing.as_str())
    .bind(order.id)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(CaptureResult::AlreadyCaptured);
    }

    sqlx::query(
        r#"
        INSERT INTO payment_transactions (id, order_id, txn_id, txn_type, amount, currency)
        VALUES ($1, $2, $3, 'capture', $4, $5)
        ON CONFLICT (order_id, txn_id) DO NOTHING
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(order.id)
    .bind(&capture.transaction_id)
    .bind(capture.money.amount().as_str())
    .bind(capture.money.currency().as_str())
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE payment_transactions
        SET is_closed = true
        WHERE order_id = $1 AND txn_type = 'authorization'
        "#,
    )
    .bind(order.id)
    .execute(&mut **tx)
    .await?;

    let invoice = Invoice {
        id: Uuid::now_v7(),
        increment_id: order.increment_id.to_string(),
    };
    sqlx::query(
        r#"
        INSERT INTO invoices (id, order_id, increment_id, amount, currency)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (order_id) DO NOTHING
        "#,
    )
    .bind(invoice.id)
    .bind(order.id)
    .bind(&invoice.increment_id)
    .bind(order.grand_total.amount().as_str())
    .bind(order.grand_total.currency().as_str())
    .execute(&mut **tx)
    .await?;

    Ok(CaptureResult::Registered(invoice))
}

pub async fn find_invoice(tx: &mut Tx<'_>, order_id: Uuid) -> Result<Option<Invoice>, PaymentError> {
    let row: Option<(Uuid, String)> =
        sqlx::query_as("SELECT id, increment_id FROM invoices WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(row.map(|(id, increment_id)| Invoice { id, increment_id }))
}

pub async fn mark_email_sent(tx: &mut Tx<'_>, order_id: Uuid) -> Result<(), PaymentError> {
    sqlx::query("UPDATE sales_orders SET email_sent = true, updated_at = now() WHERE id = $1")
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Delete an order outright. Cascades to history, transactions, invoices
/// and the charge ledger.
pub async fn delete_order(
    tx: &mut Tx<'_>,
    order_id: Uuid,
    secure_area: SecureArea,
) -> Result<bool, PaymentError> {
    let result = sqlx::query("DELETE FROM sales_orders WHERE id = $1")
        .bind(order_id)
        .execute(&mut **tx)
        .await?;

    tracing::debug!(reason = secure_area.reason(), "leaving secure area");
    Ok(result.rows_affected() > 0)
}
