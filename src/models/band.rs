use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::priced_order::DiscountTier;

/// A contiguous, inclusive range of product ids owned by one vendor, together
/// with the pricing policy applied to orders routed into it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VendorBand {
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub policy: PricingPolicy,
    /// Delivery locations offered for this band. Empty accepts any address.
    #[serde(default)]
    pub address_options: Vec<String>,
}

impl VendorBand {
    pub fn contains(&self, id: u64) -> bool {
        (self.start..=self.end).contains(&id)
    }

    pub fn overlaps(&self, other: &VendorBand) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The offered spelling of `option`, matched case-insensitively.
    pub fn match_address(&self, option: &str) -> Option<String> {
        let option = option.trim();
        if option.is_empty() {
            return None;
        }
        if self.address_options.is_empty() {
            return Some(option.to_string());
        }
        self.address_options
            .iter()
            .find(|offered| offered.eq_ignore_ascii_case(option))
            .cloned()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum PricingPolicy {
    Standard(StandardPolicy),
    Bulk(BulkPolicy),
}

impl PricingPolicy {
    pub fn tier(&self) -> DiscountTier {
        match self {
            PricingPolicy::Standard(_) => DiscountTier::Standard,
            PricingPolicy::Bulk(_) => DiscountTier::Bulk,
        }
    }
}

/// Flat discount off the list total, tax on the discounted base, fixed packing charge.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StandardPolicy {
    pub min_order: Decimal,
    pub additional_discount: Decimal,
    /// Extra percentage taken off after the flat discount, as a fraction (`0.1` = 10%).
    #[serde(default)]
    pub extra_discount_rate: Decimal,
    pub packing_charge: Decimal,
    pub tax_rate: Decimal,
}

impl Default for StandardPolicy {
    fn default() -> Self {
        Self {
            min_order: Decimal::from(314),
            additional_discount: Decimal::from(50),
            extra_discount_rate: Decimal::ZERO,
            packing_charge: Decimal::from(20),
            tax_rate: Decimal::new(5, 2),
        }
    }
}

/// List prices are tax-inclusive; orders are capped at `max_items` units.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BulkPolicy {
    pub min_order: Decimal,
    pub max_items: u32,
    pub tax_rate: Decimal,
}

impl Default for BulkPolicy {
    fn default() -> Self {
        Self {
            min_order: Decimal::from(201),
            max_items: 9,
            tax_rate: Decimal::new(5, 2),
        }
    }
}

/// Routing bands used when no configuration overrides them: ids below 500 go to
/// the standard vendor, ids above 500 to the bulk vendor. Id 500 is unrouted.
pub fn default_bands() -> Vec<VendorBand> {
    vec![
        VendorBand {
            name: "standard".to_string(),
            start: 0,
            end: 499,
            policy: PricingPolicy::Standard(StandardPolicy::default()),
            address_options: to_strings(&[
                "Anandi",
                "Bhabha",
                "Kalam",
                "Raman",
                "Ramanujan",
                "Sarabhai",
                "Sarojini Naidu",
                "Visvesvaraya",
            ]),
        },
        VendorBand {
            name: "bulk".to_string(),
            start: 501,
            end: u64::MAX,
            policy: PricingPolicy::Bulk(BulkPolicy::default()),
            address_options: to_strings(&[
                "Aryabhatta",
                "Bhaskara",
                "Charaka",
                "Shushruta",
                "Kautilya",
                "Vyasa",
                "Varahamira",
                "Ramanuja",
            ]),
        },
    ]
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The band owning `id`, if any.
pub fn route_for(bands: &[VendorBand], id: u64) -> Option<&VendorBand> {
    bands.iter().find(|band| band.contains(id))
}
