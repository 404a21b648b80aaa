use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    payment::{PaymentRequest, Receipt},
    priced_order::{PricedOrder, Rejection},
};

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("Failed to deliver message to {recipient}: {reason}")]
    Delivery { recipient: String, reason: String },
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// A follow-up arrived but there is no open order for the sender.
    NoOpenOrder,
    /// The gateway reported a payment that did not complete.
    PaymentNotCompleted,
    /// The message carried no product tags.
    Unrecognized,
    /// The chosen delivery location is not offered for the order's band.
    UnknownAddress,
}

/// Everything the bot says. Rendering to chat text belongs to the transport.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundMessage {
    Quote(PricedOrder),
    Rejected(Rejection),
    AddressPrompt { band: String, options: Vec<String> },
    PaymentRequest(PaymentRequest),
    PaymentReceived(Receipt),
    Notice(Notice),
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, recipient: &str, message: OutboundMessage) -> Result<(), MessengerError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    /// Keeps every delivered message for assertions. Sends to recipients in
    /// `unreachable` fail and are not recorded.
    #[derive(Default)]
    pub(crate) struct RecordingMessenger {
        pub(crate) sent: Mutex<Vec<(String, OutboundMessage)>>,
        unreachable: HashSet<String>,
    }

    impl RecordingMessenger {
        pub(crate) fn unreachable(recipients: &[&str]) -> Self {
            Self {
                sent: Mutex::default(),
                unreachable: recipients.iter().map(|r| r.to_string()).collect(),
            }
        }

        pub(crate) async fn sent_to(&self, recipient: &str) -> Vec<OutboundMessage> {
            self.sent
                .lock()
                .await
                .iter()
                .filter(|(to, _)| to == recipient)
                .map(|(_, message)| message.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send(
            &self,
            recipient: &str,
            message: OutboundMessage,
        ) -> Result<(), MessengerError> {
            if self.unreachable.contains(recipient) {
                return Err(MessengerError::Delivery {
                    recipient: recipient.to_string(),
                    reason: "recipient unreachable".to_string(),
                });
            }
            self.sent
                .lock()
                .await
                .push((recipient.to_string(), message));
            Ok(())
        }
    }
}
