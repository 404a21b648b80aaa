use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountTier {
    Standard,
    Bulk,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricedLineItem {
    pub id: String,
    pub name: String,
    pub unit_price_minor: i64,
    pub quantity: u32,
    pub gross_amount_minor: i64,
    pub net_amount_minor: i64,
    pub image_ref: Option<String>,
}

/// A fully priced order, in integer minor units, ready for a payment request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricedOrder {
    pub tier: DiscountTier,
    pub line_items: Vec<PricedLineItem>,
    pub gross_total_minor: i64,
    pub net_subtotal_minor: i64,
    pub tax_minor: i64,
    pub delivery_minor: i64,
    pub payable_total_minor: i64,
    pub currency: String,
}

impl PricedOrder {
    /// `payable == subtotal + tax + delivery` and `subtotal == sum(line nets)`.
    pub fn is_balanced(&self) -> bool {
        let lines: i64 = self.line_items.iter().map(|i| i.net_amount_minor).sum();
        lines == self.net_subtotal_minor
            && self.payable_total_minor
                == self.net_subtotal_minor + self.tax_minor + self.delivery_minor
    }

    pub fn item_names(&self) -> Vec<String> {
        self.line_items.iter().map(|i| i.name.clone()).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    BelowMinimum {
        /// Configured minimum, in major units.
        minimum: Decimal,
    },
    TooManyItems {
        max_per_order: u32,
        required_splits: u32,
    },
    NoItemsFound,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum PricingOutcome {
    Priced(PricedOrder),
    Rejected(Rejection),
}

impl PricingOutcome {
    pub fn priced(&self) -> Option<&PricedOrder> {
        match self {
            PricingOutcome::Priced(order) => Some(order),
            PricingOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            PricingOutcome::Priced(_) => None,
            PricingOutcome::Rejected(rejection) => Some(rejection),
        }
    }
}
