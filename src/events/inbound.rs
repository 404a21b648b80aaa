use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    handlers::{
        HandlerContext, HandlerError, address_selection::handle_address_selection,
        order_message::handle_order_message, payment_status::handle_payment_status,
    },
    messenger::{Notice, OutboundMessage},
    models::payment::{PaymentState, PaymentStatus},
};

const ADDRESS_COMMAND: &str = "!address";
const PAID_COMMAND: &str = "!paid";

#[derive(Debug, Error, PartialEq)]
pub enum InboundError {
    #[error("Empty line")]
    Empty,

    #[error("Malformed command: {0}")]
    Malformed(String),
}

/// Something that happened on the chat or payment side.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Free text from a buyer.
    Message { sender: String, text: String },
    /// The buyer picked an option from the delivery location list.
    ListReply { sender: String, option: String },
    /// Gateway callback for a payment reference.
    PaymentStatus(PaymentStatus),
}

impl InboundEvent {
    /// Parse a console line: `[<sender>\t]<body>`, where the body is free text,
    /// `!address <option>` or `!paid <reference> <amount_minor> [failed]`.
    pub fn from_console_line(line: &str, default_sender: &str) -> Result<Self, InboundError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (sender, body) = match line.split_once('\t') {
            Some((sender, body)) if !sender.trim().is_empty() => (sender.trim(), body.trim()),
            _ => (default_sender, line.trim()),
        };

        if body.is_empty() {
            return Err(InboundError::Empty);
        }

        if let Some(option) = body.strip_prefix(ADDRESS_COMMAND) {
            let option = option.trim();
            if option.is_empty() {
                return Err(InboundError::Malformed(body.to_string()));
            }
            return Ok(Self::ListReply {
                sender: sender.to_string(),
                option: option.to_string(),
            });
        }

        if let Some(args) = body.strip_prefix(PAID_COMMAND) {
            let mut parts = args.split_whitespace();
            let (Some(reference_id), Some(amount)) = (parts.next(), parts.next()) else {
                return Err(InboundError::Malformed(body.to_string()));
            };
            let amount_minor = amount
                .parse::<i64>()
                .map_err(|_| InboundError::Malformed(body.to_string()))?;
            let state = match parts.next() {
                None => PaymentState::Captured,
                Some("failed") => PaymentState::Failed,
                Some("pending") => PaymentState::Pending,
                Some(_) => return Err(InboundError::Malformed(body.to_string())),
            };

            return Ok(Self::PaymentStatus(PaymentStatus {
                reference_id: reference_id.to_string(),
                amount_minor,
                state,
                transaction_id: None,
            }));
        }

        Ok(Self::Message {
            sender: sender.to_string(),
            text: body.to_string(),
        })
    }
}

pub async fn dispatch(ctx: &HandlerContext, event: InboundEvent) -> Result<(), HandlerError> {
    match event {
        InboundEvent::Message { sender, text } => {
            if !ctx.extractor.has_tags(&text) {
                debug!("No product tags in message from {sender}");
                ctx.messenger
                    .send(&sender, OutboundMessage::Notice(Notice::Unrecognized))
                    .await?;
                return Ok(());
            }
            handle_order_message(ctx, &sender, &text).await?;
        }
        InboundEvent::ListReply { sender, option } => {
            handle_address_selection(ctx, &sender, &option).await?;
        }
        InboundEvent::PaymentStatus(status) => {
            handle_payment_status(ctx, &status).await?;
        }
    }

    Ok(())
}

/// Consume events until the channel closes, purging stale sessions on every tick.
pub async fn run(
    ctx: Arc<HandlerContext>,
    mut events: mpsc::Receiver<InboundEvent>,
    purge_every: Duration,
) {
    let mut purge = tokio::time::interval(purge_every);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!("Inbound channel closed");
                    break;
                };
                if let Err(e) = dispatch(&ctx, event).await {
                    error!("Error handling inbound event: {e}");
                }
            },
            _ = purge.tick() => {
                let purged = ctx.sessions.purge_expired().await;
                if purged > 0 {
                    info!("Purged {purged} expired sessions");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::Catalog, config::Settings, messenger::testing::RecordingMessenger,
        models::catalog_entry::CatalogEntry,
    };
    use rust_decimal::Decimal;

    #[test]
    fn test_console_line_message() {
        assert_eq!(
            InboundEvent::from_console_line("alice\t(P_ID: 11) x2", "console").unwrap(),
            InboundEvent::Message {
                sender: "alice".to_string(),
                text: "(P_ID: 11) x2".to_string()
            }
        );
        assert_eq!(
            InboundEvent::from_console_line("hello\n", "console").unwrap(),
            InboundEvent::Message {
                sender: "console".to_string(),
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_console_line_commands() {
        assert_eq!(
            InboundEvent::from_console_line("bob\t!address Kalam Hostel", "console").unwrap(),
            InboundEvent::ListReply {
                sender: "bob".to_string(),
                option: "Kalam Hostel".to_string()
            }
        );
        assert_eq!(
            InboundEvent::from_console_line("!paid ref_abc 44000", "console").unwrap(),
            InboundEvent::PaymentStatus(PaymentStatus {
                reference_id: "ref_abc".to_string(),
                amount_minor: 44000,
                state: PaymentState::Captured,
                transaction_id: None,
            })
        );

        let failed = InboundEvent::from_console_line("!paid ref_abc 44000 failed", "console");
        assert!(matches!(
            failed,
            Ok(InboundEvent::PaymentStatus(PaymentStatus {
                state: PaymentState::Failed,
                ..
            }))
        ));
    }

    #[test]
    fn test_console_line_errors() {
        assert_eq!(
            InboundEvent::from_console_line("   ", "console"),
            Err(InboundError::Empty)
        );
        assert!(matches!(
            InboundEvent::from_console_line("!paid ref_abc", "console"),
            Err(InboundError::Malformed(_))
        ));
        assert!(matches!(
            InboundEvent::from_console_line("!paid ref_abc lots", "console"),
            Err(InboundError::Malformed(_))
        ));
        assert!(matches!(
            InboundEvent::from_console_line("!address", "console"),
            Err(InboundError::Malformed(_))
        ));
    }

    fn context(messenger: Arc<RecordingMessenger>) -> HandlerContext {
        let catalog = Catalog::from_entries([CatalogEntry {
            id: "11".to_string(),
            unit_price: Decimal::from(200),
            discounted_price: None,
            display_name: "Farmhouse".to_string(),
            image_ref: None,
        }]);
        HandlerContext::new(&Settings::default(), Arc::new(catalog), messenger).unwrap()
    }

    #[tokio::test]
    async fn test_untagged_message_gets_notice() {
        let messenger = Arc::new(RecordingMessenger::default());
        let ctx = context(messenger.clone());

        dispatch(
            &ctx,
            InboundEvent::Message {
                sender: "alice".to_string(),
                text: "hi, what's on the menu?".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            messenger.sent_to("alice").await,
            vec![OutboundMessage::Notice(Notice::Unrecognized)]
        );
        assert!(ctx.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_full_conversation() {
        let messenger = Arc::new(RecordingMessenger::default());
        let ctx = Arc::new(context(messenger.clone()));
        let (tx, rx) = mpsc::channel(8);
        let runner = tokio::spawn(run(ctx.clone(), rx, Duration::from_secs(60)));

        tx.send(InboundEvent::Message {
            sender: "alice".to_string(),
            text: "(P_ID: 11)(P_ID: 11)".to_string(),
        })
        .await
        .unwrap();
        tx.send(InboundEvent::ListReply {
            sender: "alice".to_string(),
            option: "Kalam".to_string(),
        })
        .await
        .unwrap();
        drop(tx);
        runner.await.unwrap();

        // 400 - 50 = 350, tax 17.50, packing 20
        let session = ctx.sessions.get("alice").await.unwrap();
        assert_eq!(session.order.payable_total_minor, 38750);
        let reference_id = session.reference_id.unwrap();

        dispatch(
            &ctx,
            InboundEvent::PaymentStatus(PaymentStatus {
                reference_id,
                amount_minor: 38750,
                state: PaymentState::Captured,
                transaction_id: Some("pay_1".to_string()),
            }),
        )
        .await
        .unwrap();

        assert!(ctx.sessions.is_empty().await);
        let sent = messenger.sent_to("alice").await;
        assert_eq!(sent.len(), 4);
        assert!(matches!(sent[0], OutboundMessage::Quote(_)));
        assert!(matches!(sent[1], OutboundMessage::AddressPrompt { .. }));
        assert!(matches!(sent[2], OutboundMessage::PaymentRequest(_)));
        assert!(matches!(sent[3], OutboundMessage::PaymentReceived(_)));
    }
}
