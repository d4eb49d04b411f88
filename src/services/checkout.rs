//! Starting the processor checkout for a placed order.
//!
//! An order gets one charge. The charge code is written to the ledger as
//! soon as the processor returns it, under the same per-order lock the
//! reconciler takes, so `charge:created` and every later event for that
//! charge corroborate. A customer coming back to checkout is sent to the
//! charge already on record instead of a new one.

use {
    crate::adapters::coinbase::charges::{ChargeClient, ChargeRequest},
    crate::domain::{error::PaymentError, id::IncrementId, order::OrderState},
    crate::infra::postgres::{ledger_repo, order_repo},
    sqlx::PgPool,
};

pub async fn start_checkout(
    pool: &PgPool,
    charges: &ChargeClient,
    store_name: &str,
    redirect_url: &str,
    increment_id: &IncrementId,
) -> Result<String, PaymentError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SET LOCAL lock_timeout = '5s'")
        .execute(&mut *tx)
        .await?;
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("order:{increment_id}"))
        .execute(&mut *tx)
        .await?;

    let order = order_repo::find_by_increment_id(&mut *tx, increment_id)
        .await?
        .ok_or_else(|| PaymentError::OrderNotFound(increment_id.to_string()))?;

    if order.state != OrderState::Pending {
        return Err(PaymentError::CheckoutUnavailable(format!(
            "order {increment_id} is {}",
            order.state
        )));
    }

    if let Some(entry) = ledger_repo::find(&mut *tx, increment_id).await? {
        tx.commit().await?;
        let charge = charges.fetch_charge(&entry.charge_code).await?;
        tracing::info!(%increment_id, code = %charge.code, "resuming existing charge");
        return Ok(charge.hosted_url);
    }

    let request = ChargeRequest::for_order(&order, store_name, redirect_url);
    let charge = charges.create_charge(&request).await?;
    ledger_repo::insert_entry(&mut tx, increment_id, &charge.code).await?;
    tx.commit().await?;

    tracing::info!(%increment_id, code = %charge.code, "charge created, redirecting customer");
    Ok(charge.hosted_url)
}
