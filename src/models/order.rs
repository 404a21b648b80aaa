use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{band::VendorBand, catalog_entry::CatalogEntry};

/// One distinct product in an order, aggregated by quantity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub image_ref: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub gross_amount: Decimal,
}

impl LineItem {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            product_id: entry.id.clone(),
            name: entry.display_name.clone(),
            image_ref: entry.image_ref.clone(),
            quantity: 1,
            unit_price: entry.unit_price,
            gross_amount: entry.unit_price,
        }
    }

    pub fn increment(&mut self) {
        self.quantity += 1;
        self.gross_amount = self.unit_price * Decimal::from(self.quantity);
    }
}

/// Items extracted from a single inbound message, before pricing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Order {
    pub line_items: Vec<LineItem>,
    pub gross_total: Decimal,
    /// Band selected by the first tag in the message.
    pub route: Option<VendorBand>,
}

impl Order {
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }
}
