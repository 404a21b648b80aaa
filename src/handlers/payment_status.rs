use tracing::{info, warn};

use crate::{
    handlers::{HandlerContext, HandlerError},
    messenger::{Notice, OutboundMessage},
    models::payment::{PaymentState, PaymentStatus, Receipt, order_code},
};

/// Gateway callback. A captured payment matching an open order closes it and
/// sends the receipt to the buyer and the admins.
pub async fn handle_payment_status(
    ctx: &HandlerContext,
    status: &PaymentStatus,
) -> Result<Option<Receipt>, HandlerError> {
    let session = ctx
        .sessions
        .find_by_reference(&status.reference_id)
        .await
        .ok_or_else(|| HandlerError::UnknownReference(status.reference_id.clone()))?;

    if status.state != PaymentState::Captured {
        info!(
            "Payment {} for {} is {:?}",
            status.reference_id, session.sender, status.state
        );
        ctx.messenger
            .send(
                &session.sender,
                OutboundMessage::Notice(Notice::PaymentNotCompleted),
            )
            .await?;
        return Ok(None);
    }

    if status.amount_minor != session.order.payable_total_minor {
        warn!(
            "Payment {} amount {} differs from payable {}",
            status.reference_id, status.amount_minor, session.order.payable_total_minor
        );
        return Err(HandlerError::AmountMismatch {
            reference: status.reference_id.clone(),
            paid: status.amount_minor,
            expected: session.order.payable_total_minor,
        });
    }

    let Some(session) = ctx.sessions.close_by_reference(&status.reference_id).await else {
        warn!("Session for payment {} closed concurrently", status.reference_id);
        return Err(HandlerError::UnknownReference(status.reference_id.clone()));
    };

    let receipt = Receipt {
        reference_id: status.reference_id.clone(),
        order_code: order_code(&status.reference_id),
        amount_minor: status.amount_minor,
        currency: session.order.currency.clone(),
        items: session.order.item_names(),
        address: session.address.clone(),
        buyer: session.sender.clone(),
    };

    info!(
        "Payment {} received from {} (transaction {})",
        receipt.reference_id,
        receipt.buyer,
        status.transaction_id.as_deref().unwrap_or("n/a")
    );

    ctx.messenger
        .send(
            &session.sender,
            OutboundMessage::PaymentReceived(receipt.clone()),
        )
        .await?;
    ctx.notify_admins(OutboundMessage::PaymentReceived(receipt.clone()))
        .await;

    Ok(Some(receipt))
}
