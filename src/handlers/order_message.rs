use tracing::info;

use crate::{
    handlers::{HandlerContext, HandlerError},
    messenger::OutboundMessage,
    models::priced_order::PricingOutcome,
    pricing::price_order,
    session::OrderSession,
};

pub async fn handle_order_message(
    ctx: &HandlerContext,
    sender: &str,
    text: &str,
) -> Result<PricingOutcome, HandlerError> {
    let catalog = ctx.catalog.fetch().await?;
    let order = ctx.extractor.extract(text, &catalog);
    let outcome = price_order(&order, &ctx.currency);

    match (&outcome, &order.route) {
        (PricingOutcome::Priced(priced), Some(band)) => {
            info!(
                "Quoted {} for {sender}: payable {} {}",
                band.name, priced.payable_total_minor, priced.currency
            );

            ctx.sessions
                .put(OrderSession::new(sender, &band.name, priced.clone()))
                .await;

            ctx.messenger
                .send(sender, OutboundMessage::Quote(priced.clone()))
                .await?;
            ctx.notify_admins(OutboundMessage::Quote(priced.clone()))
                .await;
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
        (PricingOutcome::Rejected(rejection), _) => {
            info!("Order from {sender} rejected: {rejection:?}");
            ctx.messenger
                .send(sender, OutboundMessage::Rejected(rejection.clone()))
                .await?;
        }
        // price_order never prices an unrouted order
        (PricingOutcome::Priced(_), None) => {}
    }

    Ok(outcome)
}
