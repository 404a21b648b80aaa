pub mod catalog;
pub mod config;
pub mod events;
pub mod extractor;
pub mod handlers;
pub mod messenger;
pub mod models;
pub mod pricing;
pub mod session;
pub mod utils;

/// Label inside product tags, as in `(P_ID: 11)`.
pub const DEFAULT_TAG_LABEL: &str = "P_ID";

pub const DEFAULT_CURRENCY: &str = "INR";
