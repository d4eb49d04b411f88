use {
    crate::domain::{
        error::PaymentError,
        event::{EventType, NormalizedEvent, StatusOrder, TimelineStatus},
        notifier::{InvoiceEmail, OrderNotifier},
        order::{Capture, CaptureResult, HistoryComment, Order, OrderState, SecureArea},
        rules::{self, Action},
    },
    crate::infra::postgres::{event_repo, ledger_repo, order_repo},
    sqlx::PgPool,
    std::time::Duration,
};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No order with this increment id: never placed, or already deleted.
    OrderMissing,
    /// This event id was already processed (redelivery).
    Duplicate,
    /// The ledger links the order to a different charge.
    ChargeMismatch,
    /// Older than the status already applied; no state change.
    Stale { recorded: TimelineStatus },
    /// Same lifecycle rank as the applied status but a different outcome.
    Conflicting { recorded: TimelineStatus },
    NoMatchingRule,
    ChargeRecorded { inserted: bool },
    Held,
    AlreadyHeld,
    HoldRejected { state: OrderState },
    Canceled,
    Captured { notified: bool },
    AlreadyCaptured { notified: bool },
    /// The order is canceled or complete; the payment is not applied.
    CaptureRejected { state: OrderState },
    /// The order was already captured under a different transaction id.
    PaymentMismatch { captured: String },
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderMissing => "order_missing",
            Self::Duplicate => "duplicate",
            Self::ChargeMismatch => "charge_mismatch",
            Self::Stale { .. } => "stale",
            Self::Conflicting { .. } => "conflicting",
            Self::NoMatchingRule => "no_matching_rule",
            Self::ChargeRecorded { .. } => "charge_recorded",
            Self::Held => "held",
            Self::AlreadyHeld => "already_held",
            Self::HoldRejected { .. } => "hold_rejected",
            Self::Canceled => "canceled",
            Self::Captured { .. } => "captured",
            Self::AlreadyCaptured { .. } => "already_captured",
            Self::CaptureRejected { .. } => "capture_rejected",
            Self::PaymentMismatch { .. } => "payment_mismatch",
        }
    }
}

/// Apply one normalized webhook event to its order.
///
/// Deliveries for the same order are serialized on an advisory lock; a
/// delivery that times out waiting for it is retried once against fresh
/// state before giving up with [`PaymentError::Conflict`].
pub async fn reconcile(
    pool: &PgPool,
    notifier: &dyn OrderNotifier,
    notify_timeout: Duration,
    event: &NormalizedEvent,
    payload: &serde_json::Value,
) -> Result<ReconcileOutcome, PaymentError> {
    match reconcile_once(pool, notifier, notify_timeout, event, payload).await {
        Err(e) if e.is_lock_timeout() => {
            tracing::warn!(increment_id = %event.increment_id, "order lock contended, retrying once");
            reconcile_once(pool, notifier, notify_timeout, event, payload)
                .await
                .map_err(|e| {
                    if e.is_lock_timeout() {
                        PaymentError::Conflict(format!(
                            "order {} is held by another delivery",
                            event.increment_id
                        ))
                    } else {
                        e
                    }
                })
        }
        other => other,
    }
}

async fn reconcile_once(
    pool: &PgPool,
    notifier: &dyn OrderNotifier,
    notify_timeout: Duration,
    event: &NormalizedEvent,
    payload: &serde_json::Value,
) -> Result<ReconcileOutcome, PaymentError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SET LOCAL lock_timeout = '5s'")
        .execute(&mut *tx)
        .await?;

    // Serialize all processing for this order. Works whether or not the
    // order or its ledger row exist.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("order:{}", event.increment_id))
        .execute(&mut *tx)
        .await?;

    let Some(order) = order_repo::find_by_increment_id(&mut *tx, &event.increment_id).await?
    else {
        tx.commit().await?;
        tracing::info!(increment_id = %event.increment_id, "no such order, nothing to reconcile");
        return Ok(ReconcileOutcome::OrderMissing);
    };

    if !event_repo::record_delivery(&mut tx, event, payload).await? {
        tx.commit().await?;
        return Ok(ReconcileOutcome::Duplicate);
    }

    if event.timeline_status == TimelineStatus::Unknown && event.event_type != EventType::Created
    {
        tx.commit().await?;
        tracing::info!(
            increment_id = %event.increment_id,
            event_type = %event.event_type,
            "unrecognised timeline status, nothing to apply"
        );
        return Ok(ReconcileOutcome::NoMatchingRule);
    }

    if let Some(entry) = ledger_repo::find(&mut *tx, &event.increment_id).await? {
        if !entry.corroborates(&event.charge_code) {
            tx.commit().await?;
            tracing::warn!(
                increment_id = %event.increment_id,
                ledger = %entry.charge_code,
                incoming = %event.charge_code,
                "charge code does not match ledger, ignoring event"
            );
            return Ok(ReconcileOutcome::ChargeMismatch);
        }

        let comparable = entry
            .last_status
            .filter(|_| event.timeline_status != TimelineStatus::Unknown);
        if let Some(recorded) = comparable {
            match event.timeline_status.may_follow(&recorded) {
                StatusOrder::Regression => {
                    tx.commit().await?;
                    tracing::warn!(
                        increment_id = %event.increment_id,
                        recorded = %recorded,
                        incoming = %event.timeline_status,
                        "stale status, skipped"
                    );
                    return Ok(ReconcileOutcome::Stale { recorded });
                }
                StatusOrder::Conflicting => {
                    tx.commit().await?;
                    tracing::warn!(
                        increment_id = %event.increment_id,
                        recorded = %recorded,
                        incoming = %event.timeline_status,
                        "conflicting terminal status, logged as anomaly"
                    );
                    return Ok(ReconcileOutcome::Conflicting { recorded });
                }
                StatusOrder::Same | StatusOrder::Advance => {}
            }
        }
    }

    let Some(rule) = rules::decide(event) else {
        record_status(&mut tx, event).await?;
        tx.commit().await?;
        return Ok(ReconcileOutcome::NoMatchingRule);
    };

    tracing::info!(
        increment_id = %event.increment_id,
        rule = rule.name,
        action = rule.action.as_str(),
        "rule matched"
    );

    let outcome = match rule.action {
        Action::RecordChargeCode => {
            let inserted =
                ledger_repo::insert_entry(&mut tx, &event.increment_id, &event.charge_code).await?;
            ReconcileOutcome::ChargeRecorded { inserted }
        }
        Action::Hold => hold(&mut tx, &order, event).await?,
        Action::Cancel => {
            // The ledger row goes with the order.
            let secure_area = SecureArea::enter("charge expired, abandoned cart");
            order_repo::delete_order(&mut tx, order.id, secure_area).await?;
            tx.commit().await?;
            return Ok(ReconcileOutcome::Canceled);
        }
        Action::Capture => capture(&mut tx, &order, event, notifier, notify_timeout).await?,
    };

    record_status(&mut tx, event).await?;
    tx.commit().await?;
    Ok(outcome)
}

async fn record_status(tx: &mut Tx<'_>, event: &NormalizedEvent) -> Result<(), PaymentError> {
    if event.timeline_status == TimelineStatus::Unknown {
        return Ok(());
    }
    ledger_repo::record_status(
        tx,
        &event.increment_id,
        &event.charge_code,
        event.timeline_status,
        event.status_at,
    )
    .await
}

async fn hold(
    tx: &mut Tx<'_>,
    order: &Order,
    event: &NormalizedEvent,
) -> Result<ReconcileOutcome, PaymentError> {
    if order.state == OrderState::Holded {
        return Ok(ReconcileOutcome::AlreadyHeld);
    }
    if !order.state.can_hold() {
        tracing::warn!(
            increment_id = %order.increment_id,
            state = %order.state,
            "order cannot be put on hold"
        );
        return Ok(ReconcileOutcome::HoldRejected { state: order.state });
    }

    let comment = match event.timeline_context.as_deref() {
        Some(context) if !context.is_empty() => context.to_string(),
        _ => HistoryComment::ipn(event.timeline_status.as_str(), "").comment,
    };
    let entry = HistoryComment {
        comment,
        status: Some(OrderState::Holded),
        is_customer_notified: None,
    };
    order_repo::add_history(tx, order.id, &entry).await?;
    order_repo::set_state(tx, order.id, OrderState::Holded).await?;
    Ok(ReconcileOutcome::Held)
}

async fn capture(
    tx: &mut Tx<'_>,
    order: &Order,
    event: &NormalizedEvent,
    notifier: &dyn OrderNotifier,
    notify_timeout: Duration,
) -> Result<ReconcileOutcome, PaymentError> {
    if !order.state.can_capture() {
        tracing::warn!(
            increment_id = %order.increment_id,
            state = %order.state,
            "order cannot take a payment capture"
        );
        return Ok(ReconcileOutcome::CaptureRejected { state: order.state });
    }

    let payment = event.payment.as_ref().ok_or_else(|| {
        PaymentError::MalformedEvent("completed charge carries no payment".into())
    })?;

    if let Some(captured) = order.payment.transaction_id.as_deref() {
        if captured != payment.transaction_id {
            tracing::warn!(
                increment_id = %order.increment_id,
                captured,
                incoming = %payment.transaction_id,
                "order already captured under another transaction, logged as anomaly"
            );
            return Ok(ReconcileOutcome::PaymentMismatch {
                captured: captured.to_string(),
            });
        }
    }

    let capture = Capture {
        transaction_id: payment.transaction_id.clone(),
        money: payment.crypto.clone(),
    };
    let result = order_repo::register_capture(tx, order, &capture).await?;

    if let CaptureResult::Registered(_) = result {
        let ipn = HistoryComment::ipn(event.timeline_status.as_str(), &payment.crypto.to_string());
        order_repo::add_history(tx, order.id, &ipn).await?;
    }

    let notified = notify_invoice(tx, order, notifier, notify_timeout).await?;

    Ok(match result {
        CaptureResult::Registered(_) => ReconcileOutcome::Captured { notified },
        CaptureResult::AlreadyCaptured => ReconcileOutcome::AlreadyCaptured { notified },
    })
}

/// Send the invoice email once: only when an invoice exists and the order
/// has not had its confirmation yet.
async fn notify_invoice(
    tx: &mut Tx<'_>,
    order: &Order,
    notifier: &dyn OrderNotifier,
    notify_timeout: Duration,
) -> Result<bool, PaymentError> {
    if order.email_sent {
        return Ok(false);
    }
    let Some(invoice) = order_repo::find_invoice(tx, order.id).await? else {
        return Ok(false);
    };

    let email = InvoiceEmail {
        increment_id: order.increment_id.clone(),
        invoice_increment_id: invoice.increment_id.clone(),
        customer_name: order.customer.name.clone(),
        customer_email: order.customer.email.clone(),
    };
    tokio::time::timeout(notify_timeout, notifier.send_invoice_email(email))
        .await
        .map_err(|_| PaymentError::Timeout("invoice email".into()))??;

    order_repo::mark_email_sent(tx, order.id).await?;
    order_repo::add_history(tx, order.id, &HistoryComment::invoice_notified(&invoice)).await?;
    Ok(true)
}
