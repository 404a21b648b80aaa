use serde::{Deserialize, Serialize};

use super::priced_order::PricedOrder;

pub const DELIVERY_LINE_NAME: &str = "Delivery Fee";

/// One line of a gateway order. `amount_minor` is the line total.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentLine {
    pub name: String,
    pub image_ref: Option<String>,
    pub quantity: u32,
    pub amount_minor: i64,
}

/// Structure handed to the payment gateway. The delivery fee travels as its own
/// line so that `sum(items) == subtotal` and `subtotal + tax == total`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentRequest {
    pub reference_id: String,
    pub currency: String,
    pub items: Vec<PaymentLine>,
    pub subtotal_minor: i64,
    pub tax_minor: i64,
    pub total_minor: i64,
    pub address: String,
}

impl PaymentRequest {
    pub fn from_priced(reference_id: &str, order: &PricedOrder, address: &str) -> Self {
        let mut items: Vec<PaymentLine> = order
            .line_items
            .iter()
            .map(|item| PaymentLine {
                name: item.name.clone(),
                image_ref: item.image_ref.clone(),
                quantity: item.quantity,
                amount_minor: item.net_amount_minor,
            })
            .collect();

        items.push(PaymentLine {
            name: DELIVERY_LINE_NAME.to_string(),
            image_ref: None,
            quantity: 1,
            amount_minor: order.delivery_minor,
        });

        let subtotal_minor = order.net_subtotal_minor + order.delivery_minor;

        Self {
            reference_id: reference_id.to_string(),
            currency: order.currency.clone(),
            items,
            subtotal_minor,
            tax_minor: order.tax_minor,
            total_minor: subtotal_minor + order.tax_minor,
            address: address.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Captured,
    Pending,
    Failed,
}

/// Gateway notification about a payment against an order reference.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentStatus {
    pub reference_id: String,
    pub amount_minor: i64,
    pub state: PaymentState,
    pub transaction_id: Option<String>,
}

/// Confirmation sent once a payment has been received.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Receipt {
    pub reference_id: String,
    /// Short code read out to the buyer: last three characters of the reference.
    pub order_code: String,
    pub amount_minor: i64,
    pub currency: String,
    pub items: Vec<String>,
    pub address: Option<String>,
    pub buyer: String,
}

pub fn order_code(reference_id: &str) -> String {
    let chars: Vec<char> = reference_id.chars().collect();
    let start = chars.len().saturating_sub(3);
    chars[start..].iter().collect()
}
