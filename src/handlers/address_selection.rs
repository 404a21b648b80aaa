use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    handlers::{HandlerContext, HandlerError},
    messenger::{Notice, OutboundMessage},
    models::payment::PaymentRequest,
};

/// The buyer picked a delivery location: attach it to their open order and
/// send the payment request. Picking again keeps the order's payment reference,
/// so an earlier payment request stays payable.
pub async fn handle_address_selection(
    ctx: &HandlerContext,
    sender: &str,
    option: &str,
) -> Result<PaymentRequest, HandlerError> {
    let Some(session) = ctx.sessions.get(sender).await else {
        return Err(no_open_order(ctx, sender).await);
    };

    let band = ctx.extractor.band(&session.band);
    let address = match band {
        Some(band) => band.match_address(option),
        None => Some(option.trim().to_string()).filter(|a| !a.is_empty()),
    };

    let Some(address) = address else {
        warn!("{sender} chose {option:?}, not offered for band {}", session.band);
        ctx.messenger
            .send(sender, OutboundMessage::Notice(Notice::UnknownAddress))
            .await?;
        if let Some(band) = band {
            ctx.messenger
                .send(
                    sender,
                    OutboundMessage::AddressPrompt {
                        band: band.name.clone(),
                        options: band.address_options.clone(),
                    },
                )
                .await?;
        }
        return Err(HandlerError::UnknownAddress(option.to_string()));
    };

    let request = ctx
        .sessions
        .update(sender, |session| {
            let reference_id = session
                .reference_id
                .get_or_insert_with(|| format!("ref_{}", Uuid::new_v4().simple()))
                .clone();
            session.address = Some(address.clone());
            PaymentRequest::from_priced(&reference_id, &session.order, &address)
        })
        .await;

    let Some(request) = request else {
        return Err(no_open_order(ctx, sender).await);
    };

    info!(
        "Payment request {} for {sender}: total {} {}",
        request.reference_id, request.total_minor, request.currency
    );

    ctx.messenger
        .send(sender, OutboundMessage::PaymentRequest(request.clone()))
        .await?;

    Ok(request)
}

async fn no_open_order(ctx: &HandlerContext, sender: &str) -> HandlerError {
    warn!("Address selection from {sender} without an open order");
    match ctx
        .messenger
        .send(sender, OutboundMessage::Notice(Notice::NoOpenOrder))
        .await
    {
        Ok(()) => HandlerError::NoSession(sender.to_string()),
        Err(e) => e.into(),
    }
}
