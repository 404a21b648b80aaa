pub mod address_selection;
pub mod order_message;
pub mod payment_status;

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

use crate::{
    catalog::{CatalogError, source::CatalogSource},
    config::{Settings, SettingsError},
    extractor::OrderExtractor,
    messenger::{Messenger, MessengerError, OutboundMessage},
    session::SessionStore,
    utils::tag::TagScanner,
};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to send response: {0}")]
    Messenger(#[from] MessengerError),

    #[error("No open order for {0}")]
    NoSession(String),

    #[error("No open order for payment reference {0}")]
    UnknownReference(String),

    #[error("Payment {reference} of {paid} does not match payable total {expected}")]
    AmountMismatch {
        reference: String,
        paid: i64,
        expected: i64,
    },

    #[error("{0} is not a delivery location for this order")]
    UnknownAddress(String),

    #[error("Invalid tag label: {0}")]
    TagLabel(#[from] regex::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Shared collaborators for every handler.
pub struct HandlerContext {
    pub catalog: Arc<dyn CatalogSource>,
    pub extractor: OrderExtractor,
    pub sessions: SessionStore,
    pub messenger: Arc<dyn Messenger>,
    pub currency: String,
    pub admin_recipients: Vec<String>,
}

impl HandlerContext {
    pub fn new(
        settings: &Settings,
        catalog: Arc<dyn CatalogSource>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self, HandlerError> {
        settings.validate()?;
        let scanner = TagScanner::new(&settings.tag_label)?;

        Ok(Self {
            catalog,
            extractor: OrderExtractor::new(scanner, settings.bands.clone()),
            sessions: SessionStore::new(settings.session_ttl()),
            messenger,
            currency: settings.currency.clone(),
            admin_recipients: settings.admin_recipients.clone(),
        })
    }

    /// Relay a copy to every admin. Delivery failures are logged, not returned.
    pub async fn notify_admins(&self, message: OutboundMessage) {
        let sends = self
            .admin_recipients
            .iter()
            .map(|admin| self.messenger.send(admin, message.clone()));

        for result in join_all(sends).await {
            if let Err(e) = result {
                warn!("Admin relay failed: {e}");
            }
        }
    }
}
