//! Price catalog snapshot and lookups.
//!
//! The catalog is published as a spreadsheet exported to CSV. A snapshot is
//! fetched once per inbound order and never mutated afterwards, so it can be
//! shared freely between concurrent requests.

pub mod source;

use std::{collections::HashMap, io::Read};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    models::{band::VendorBand, catalog_entry::CatalogEntry},
    utils::money::parse_major,
};

pub const COLUMN_ID: &str = "Product";
pub const COLUMN_PRICE: &str = "Price (Original)";
pub const COLUMN_DISCOUNTED_PRICE: &str = "Price (Discounted)";
pub const COLUMN_NAME: &str = "Name";
pub const COLUMN_IMAGE: &str = "Image URL";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch catalog: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] csv::Error),

    #[error("Catalog is missing required column: {0}")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.id = canonical_id(&entry.id);
                (entry.id.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Parse a CSV export. Rows without an id or a usable list price are skipped;
    /// a blank name becomes empty and a blank image becomes `None`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let columns = Columns::locate(&headers)?;

        let mut entries = HashMap::new();
        for (row, record) in csv.records().enumerate() {
            let record = record?;
            if let Some(entry) = columns.entry(&record, row) {
                entries.insert(entry.id.clone(), entry);
            }
        }

        debug!("Parsed catalog with {} entries", entries.len());

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(&canonical_id(id))
    }

    /// Look up `id`, restricted to the rows owned by `band`.
    pub fn resolve(&self, id: u64, band: &VendorBand) -> Option<&CatalogEntry> {
        if !band.contains(id) {
            return None;
        }
        self.entries.get(&id.to_string())
    }
}

/// Numeric ids are keyed without leading zeros so `"057"` and `57` agree.
fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(id) => id.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

struct Columns {
    id: usize,
    price: usize,
    discounted_price: Option<usize>,
    name: Option<usize>,
    image: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, CatalogError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        Ok(Self {
            id: find(COLUMN_ID).ok_or(CatalogError::MissingColumn(COLUMN_ID))?,
            price: find(COLUMN_PRICE).ok_or(CatalogError::MissingColumn(COLUMN_PRICE))?,
            discounted_price: find(COLUMN_DISCOUNTED_PRICE),
            name: find(COLUMN_NAME),
            image: find(COLUMN_IMAGE),
        })
    }

    fn entry(&self, record: &StringRecord, row: usize) -> Option<CatalogEntry> {
        let field = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .filter(|value| !value.is_empty())
        };

        let id = field(Some(self.id))?;
        let price = field(Some(self.price))?;

        let unit_price = match parse_major(price) {
            Ok(price) => price,
            Err(e) => {
                warn!("Skipping catalog row {} (product {id}): {e}", row + 1);
                return None;
            }
        };

        Some(CatalogEntry {
            id: canonical_id(id),
            unit_price,
            discounted_price: field(self.discounted_price).and_then(|p| parse_major(p).ok()),
            display_name: field(self.name).unwrap_or_default().to_string(),
            image_ref: field(self.image).map(str::to_string),
        })
    }
}
