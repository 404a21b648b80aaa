//! Discount, tax and fee policies, and exact allocation of the discounted
//! total back onto the order's lines.
//!
//! Everything after the major-to-minor conversion is integer arithmetic, so the
//! published figures always reconcile: `sum(line nets) == net subtotal` and
//! `net subtotal + tax + delivery == payable total`.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    models::{
        band::{BulkPolicy, PricingPolicy, StandardPolicy},
        order::Order,
        priced_order::{PricedLineItem, PricedOrder, PricingOutcome, Rejection},
    },
    utils::money::{apply_rate, round_minor, to_minor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Breakdown {
    net_subtotal_minor: i64,
    tax_minor: i64,
    delivery_minor: i64,
    payable_total_minor: i64,
}

/// Price `order` under the policy of the band it was routed to.
pub fn price_order(order: &Order, currency: &str) -> PricingOutcome {
    let band = match &order.route {
        Some(band) if !order.is_empty() => band,
        _ => {
            info!("Order rejected: no valid items found");
            return PricingOutcome::Rejected(Rejection::NoItemsFound);
        }
    };

    let lines: Vec<(i64, i64)> = order
        .line_items
        .iter()
        .map(|item| {
            let unit_minor = to_minor(item.unit_price);
            (unit_minor, unit_minor * i64::from(item.quantity))
        })
        .collect();
    let gross_total_minor: i64 = lines.iter().map(|(_, gross)| gross).sum();

    let breakdown = match &band.policy {
        PricingPolicy::Standard(policy) => price_standard(policy, gross_total_minor),
        PricingPolicy::Bulk(policy) => price_bulk(policy, order.item_count(), gross_total_minor),
    };

    let breakdown = match breakdown {
        Ok(breakdown) => reconcile(breakdown),
        Err(rejection) => {
            info!("Order in band {} rejected: {rejection:?}", band.name);
            return PricingOutcome::Rejected(rejection);
        }
    };

    let weights: Vec<i64> = lines.iter().map(|(_, gross)| *gross).collect();
    let nets = allocate(breakdown.net_subtotal_minor, &weights);

    let line_items = order
        .line_items
        .iter()
        .zip(lines.iter().zip(nets))
        .map(|(item, (&(unit_minor, gross_minor), net_minor))| PricedLineItem {
            id: item.product_id.clone(),
            name: item.name.clone(),
            unit_price_minor: unit_minor,
            quantity: item.quantity,
            gross_amount_minor: gross_minor,
            net_amount_minor: net_minor,
            image_ref: item.image_ref.clone(),
        })
        .collect();

    let priced = PricedOrder {
        tier: band.policy.tier(),
        line_items,
        gross_total_minor,
        net_subtotal_minor: breakdown.net_subtotal_minor,
        tax_minor: breakdown.tax_minor,
        delivery_minor: breakdown.delivery_minor,
        payable_total_minor: breakdown.payable_total_minor,
        currency: currency.to_string(),
    };

    debug!(
        "Priced order in band {}: gross {} net {} tax {} delivery {} payable {}",
        band.name,
        priced.gross_total_minor,
        priced.net_subtotal_minor,
        priced.tax_minor,
        priced.delivery_minor,
        priced.payable_total_minor
    );

    PricingOutcome::Priced(priced)
}

/// Flat discount, optional extra percentage, tax on the discounted base, packing charge.
fn price_standard(policy: &StandardPolicy, gross_total_minor: i64) -> Result<Breakdown, Rejection> {
    if gross_total_minor < to_minor(policy.min_order) {
        return Err(Rejection::BelowMinimum {
            minimum: policy.min_order,
        });
    }

    let after_flat = (gross_total_minor - to_minor(policy.additional_discount)).max(0);
    let base = round_minor(Decimal::from(after_flat) * (Decimal::ONE - policy.extra_discount_rate));

    let tax_minor = apply_rate(base, policy.tax_rate);
    let delivery_minor = to_minor(policy.packing_charge);
    let payable_total_minor =
        round_minor(Decimal::from(base) * (Decimal::ONE + policy.tax_rate)) + delivery_minor;

    Ok(Breakdown {
        net_subtotal_minor: base,
        tax_minor,
        delivery_minor,
        payable_total_minor,
    })
}

/// Item cap, then tax backed out of a tax-inclusive gross. No delivery fee.
fn price_bulk(
    policy: &BulkPolicy,
    item_count: u32,
    gross_total_minor: i64,
) -> Result<Breakdown, Rejection> {
    let max_items = policy.max_items.max(1);
    if item_count > max_items {
        return Err(Rejection::TooManyItems {
            max_per_order: max_items,
            required_splits: item_count.div_ceil(max_items),
        });
    }

    if gross_total_minor < to_minor(policy.min_order) {
        return Err(Rejection::BelowMinimum {
            minimum: policy.min_order,
        });
    }

    let net_subtotal_minor =
        round_minor(Decimal::from(gross_total_minor) / (Decimal::ONE + policy.tax_rate));

    Ok(Breakdown {
        net_subtotal_minor,
        tax_minor: gross_total_minor - net_subtotal_minor,
        delivery_minor: 0,
        payable_total_minor: gross_total_minor,
    })
}

/// Any minor-unit difference between the tier's payable total and its parts is
/// absorbed into tax.
fn reconcile(mut breakdown: Breakdown) -> Breakdown {
    let parts = breakdown.net_subtotal_minor + breakdown.tax_minor + breakdown.delivery_minor;
    let drift = breakdown.payable_total_minor - parts;

    if drift != 0 {
        warn!("Reconciling {drift} minor units of rounding drift into tax");
        breakdown.tax_minor += drift;
    }

    breakdown
}

/// Split `total` across lines in proportion to `weights` using the largest
/// remainder method. Each line gets the floor of its exact share; leftover units
/// go one at a time to the largest fractional remainders, earlier lines first on
/// ties. The result always sums to `total`.
pub fn allocate(total: i64, weights: &[i64]) -> Vec<i64> {
    if weights.is_empty() {
        return Vec::new();
    }

    let weight_sum: i128 = weights.iter().map(|&w| i128::from(w.max(0))).sum();
    if weight_sum == 0 {
        let mut shares = vec![0; weights.len()];
        if let Some(last) = shares.last_mut() {
            *last = total;
        }
        return shares;
    }

    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());

    for (index, &weight) in weights.iter().enumerate() {
        let exact = i128::from(total) * i128::from(weight.max(0));
        shares.push((exact.div_euclid(weight_sum)) as i64);
        remainders.push((exact.rem_euclid(weight_sum), index));
    }

    let leftover = total - shares.iter().sum::<i64>();

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, index) in remainders.iter().take(leftover.max(0) as usize) {
        shares[index] += 1;
    }

    shares
}
