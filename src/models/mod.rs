pub mod band;
pub mod catalog_entry;
pub mod order;
pub mod payment;
pub mod priced_order;
