use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    models::{
        band::{VendorBand, route_for},
        order::{LineItem, Order},
    },
    utils::tag::TagScanner,
};

/// Turns free-text order messages into grouped line items.
#[derive(Debug, Clone)]
pub struct OrderExtractor {
    scanner: TagScanner,
    bands: Vec<VendorBand>,
}

impl OrderExtractor {
    pub fn new(scanner: TagScanner, bands: Vec<VendorBand>) -> Self {
        Self { scanner, bands }
    }

    pub fn has_tags(&self, text: &str) -> bool {
        self.scanner.has_tags(text)
    }

    pub fn band(&self, name: &str) -> Option<&VendorBand> {
        self.bands.iter().find(|band| band.name == name)
    }

    /// The first tag that resolves in the catalog picks the vendor band; every
    /// later tag is then resolved inside that band and grouped by product id.
    /// Unresolvable tags are skipped.
    pub fn extract(&self, text: &str, catalog: &Catalog) -> Order {
        let ids: Vec<u64> = self.scanner.scan(text).collect();

        if ids.is_empty() {
            debug!("No product tags in message");
            return Order::default();
        }

        let routed = ids.iter().enumerate().find_map(|(index, &id)| {
            route_for(&self.bands, id)
                .filter(|band| catalog.resolve(id, band).is_some())
                .map(|band| (index, band))
        });

        let Some((start, band)) = routed else {
            warn!("No product tag in message resolves in any vendor band");
            return Order::default();
        };

        for id in &ids[..start] {
            warn!("Skipping product {id}: not listed in any vendor band");
        }

        let mut line_items: Vec<LineItem> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for &id in &ids[start..] {
            let Some(entry) = catalog.resolve(id, band) else {
                warn!("No catalog entry for product {id} in band {}", band.name);
                continue;
            };

            match positions.get(&entry.id) {
                Some(&index) => line_items[index].increment(),
                None => {
                    positions.insert(entry.id.clone(), line_items.len());
                    line_items.push(LineItem::from_entry(entry));
                }
            }
        }

        let gross_total: Decimal = line_items.iter().map(|item| item.gross_amount).sum();

        debug!(
            "Extracted {} line items, gross total {gross_total}, band {}",
            line_items.len(),
            band.name
        );

        Order {
            line_items,
            gross_total,
            route: Some(band.clone()),
        }
    }
}
