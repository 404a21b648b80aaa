use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sellable product as published in the price sheet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    /// List price in major units.
    pub unit_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub display_name: String,
    pub image_ref: Option<String>,
}
