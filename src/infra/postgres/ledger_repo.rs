use {
    crate::domain::{
        error::PaymentError,
        event::TimelineStatus,
        id::{ChargeCode, IncrementId},
        ledger::ChargeLedgerEntry,
    },
    chrono::{DateTime, Utc},
    sqlx::PgExecutor,
};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: i32,
    store_order_id: String,
    coinbase_charge_code: String,
    last_status: Option<String>,
    last_status_at: Option<DateTime<Utc>>,
}

impl TryFrom<LedgerRow> for ChargeLedgerEntry {
    type Error = PaymentError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(ChargeLedgerEntry {
            id: row.id,
            store_order_id: IncrementId::new(row.store_order_id)?,
            charge_code: ChargeCode::new(row.coinbase_charge_code)?,
            last_status: row
                .last_status
                .as_deref()
                .map(TimelineStatus::try_from)
                .transpose()?,
            last_status_at: row.last_status_at,
        })
    }
}

pub async fn find<'e, E: PgExecutor<'e>>(
    executor: E,
    store_order_id: &IncrementId,
) -> Result<Option<ChargeLedgerEntry>, PaymentError> {
    let row = sqlx::query_as::<_, LedgerRow>(
        r#"
        SELECT id, store_order_id, coinbase_charge_code, last_status, last_status_at
        FROM coinbase_charges
        WHERE store_order_id = $1
        "#,
    )
    .bind(store_order_id.as_str())
    .fetch_optional(executor)
    .await?;

    row.map(ChargeLedgerEntry::try_from).transpose()
}

/// Write the ledger entry for an order.
/// Returns `true` if inserted, `false` if the order already had one.
pub async fn insert_entry(
    tx: &mut Tx<'_>,
    store_order_id: &IncrementId,
    charge_code: &ChargeCode,
) -> Result<bool, PaymentError> {
    let inserted: Option<i32> = sqlx::query_scalar(
        r#"
        INSERT INTO coinbase_charges (store_order_id, coinbase_charge_code)
        VALUES ($1, $2)
        ON CONFLICT (store_order_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(store_order_id.as_str())
    .bind(charge_code.as_str())
    .fetch_optional(&mut **tx)
    .await?;

    Ok(inserted.is_some())
}

/// Record the last applied timeline status, linking the order to the
/// charge first if `charge:created` has not arrived yet. The charge code of
/// an existing entry is left untouched.
pub async fn record_status(
    tx: &mut Tx<'_>,
    store_order_id: &IncrementId,
    charge_code: &ChargeCode,
    status: TimelineStatus,
    at: DateTime<Utc>,
) -> Result<(), PaymentError> {
    sqlx::query(
        r#"
        INSERT INTO coinbase_charges
            (store_order_id, coinbase_charge_code, last_status, last_status_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (store_order_id) DO UPDATE
        SET last_status = EXCLUDED.last_status,
            last_status_at = GREATEST(coinbase_charges.last_status_at, EXCLUDED.last_status_at),
            updated_at = now()
        "#,
    )
    .bind(store_order_id.as_str())
    .bind(charge_code.as_str())
    .bind(status.as_str())
    .bind(at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
