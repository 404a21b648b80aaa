use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    DEFAULT_CURRENCY, DEFAULT_TAG_LABEL,
    models::band::{PricingPolicy, VendorBand, default_bands},
    utils::money::check_amount,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// File path or `http(s)://` URL of the published price sheet.
    pub source: String,
    pub fetch_timeout_secs: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            source: "catalog.csv".to_string(),
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub currency: String,
    pub tag_label: String,
    pub catalog: CatalogSettings,
    pub bands: Vec<VendorBand>,
    pub session_ttl_secs: u64,
    /// Recipients who get a copy of every quote and receipt.
    pub admin_recipients: Vec<String>,
}

impl Settings {
    pub fn load(config_path: &Option<String>) -> Result<Self, SettingsError> {
        let default = Self::default();

        match Self::load_from_file(config_path) {
            Ok(settings) => Ok(settings),
            Err(err) if config_path.is_none() => {
                warn!("Could not read config file: {err}. Using default configuration.",);
                Ok(default)
            }
            Err(err) => Err(err),
        }
    }

    fn load_from_file(config_path: &Option<String>) -> Result<Self, SettingsError> {
        let path = config_path.as_deref().unwrap_or("poolcart.toml");

        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("POOLCART").separator("__"))
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tag_label.trim().is_empty() {
            return Err(SettingsError::Invalid("tag_label must not be empty".into()));
        }

        if self.bands.is_empty() {
            return Err(SettingsError::Invalid("at least one band is required".into()));
        }

        for (i, band) in self.bands.iter().enumerate() {
            if band.start > band.end {
                return Err(SettingsError::Invalid(format!(
                    "band {} starts after it ends ({} > {})",
                    band.name, band.start, band.end
                )));
            }

            if let Some(other) = self.bands[..i].iter().find(|other| other.overlaps(band)) {
                return Err(SettingsError::Invalid(format!(
                    "bands {} and {} overlap",
                    other.name, band.name
                )));
            }

            validate_policy(&band.name, &band.policy)?;
        }

        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.fetch_timeout_secs)
    }
}

fn validate_policy(band: &str, policy: &PricingPolicy) -> Result<(), SettingsError> {
    let amount = |field: &str, value: Decimal| {
        check_amount(value)
            .map(|_| ())
            .map_err(|e| SettingsError::Invalid(format!("band {band} {field}: {e}")))
    };
    let rate = |field: &str, value: Decimal| {
        if value < Decimal::ZERO || value >= Decimal::ONE {
            Err(SettingsError::Invalid(format!(
                "band {band} {field} must be in [0, 1), got {value}"
            )))
        } else {
            Ok(())
        }
    };

    match policy {
        PricingPolicy::Standard(p) => {
            amount("min_order", p.min_order)?;
            amount("additional_discount", p.additional_discount)?;
            amount("packing_charge", p.packing_charge)?;
            rate("extra_discount_rate", p.extra_discount_rate)?;
            rate("tax_rate", p.tax_rate)?;
        }
        PricingPolicy::Bulk(p) => {
            amount("min_order", p.min_order)?;
            rate("tax_rate", p.tax_rate)?;
            if p.max_items == 0 {
                return Err(SettingsError::Invalid(format!(
                    "band {band} max_items must be at least 1"
                )));
            }
        }
    }

    Ok(())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            tag_label: DEFAULT_TAG_LABEL.to_string(),
            catalog: CatalogSettings::default(),
            bands: default_bands(),
            session_ttl_secs: 30 * 60,
            admin_recipients: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::band::{BulkPolicy, StandardPolicy};
    use std::io::Write;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.currency, "INR");
        assert_eq!(settings.tag_label, "P_ID");
        assert_eq!(settings.bands.len(), 2);
        assert_eq!(settings.session_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn test_missing_default_file_falls_back() {
        let settings = Settings::load(&None).unwrap();
        assert_eq!(settings.bands, default_bands());
    }

    #[test]
    fn test_load_bands_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
session_ttl_secs = 600
admin_recipients = ["918000000000"]

[catalog]
source = "https://docs.example/pub?output=csv"

[[bands]]
name = "campus"
start = 1
end = 99
address_options = ["Kalam", "Raman"]

[bands.policy]
tier = "standard"
min_order = 100
additional_discount = 50
packing_charge = 20
tax_rate = "0.05"

[[bands]]
name = "mess"
start = 100
end = 199

[bands.policy]
tier = "bulk"
min_order = 201
max_items = 9
tax_rate = "0.05"
"#
        )
        .unwrap();

        let path = Some(file.path().to_string_lossy().to_string());
        let settings = Settings::load(&path).unwrap();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.session_ttl_secs, 600);
        assert_eq!(settings.admin_recipients, vec!["918000000000".to_string()]);
        assert_eq!(settings.catalog.source, "https://docs.example/pub?output=csv");
        assert_eq!(settings.catalog.fetch_timeout_secs, 10);
        assert_eq!(settings.currency, "INR");
        assert_eq!(settings.bands.len(), 2);
        assert_eq!(settings.bands[0].address_options, vec!["Kalam", "Raman"]);
        assert!(settings.bands[1].address_options.is_empty());
        assert_eq!(
            settings.bands[0].policy,
            PricingPolicy::Standard(StandardPolicy {
                min_order: Decimal::from(100),
                ..StandardPolicy::default()
            })
        );
        assert_eq!(
            settings.bands[1].policy,
            PricingPolicy::Bulk(BulkPolicy::default())
        );
    }

    #[test]
    fn test_validate_rejects_overlapping_bands() {
        let mut settings = Settings::default();
        settings.bands[1].start = 400;

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let mut settings = Settings::default();
        settings.bands[0].start = 600;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_policy_values() {
        let mut settings = Settings::default();
        if let PricingPolicy::Bulk(policy) = &mut settings.bands[1].policy {
            policy.max_items = 0;
        }
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        if let PricingPolicy::Standard(policy) = &mut settings.bands[0].policy {
            policy.tax_rate = Decimal::ONE;
        }
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        if let PricingPolicy::Standard(policy) = &mut settings.bands[0].policy {
            policy.packing_charge = Decimal::from(-20);
        }
        assert!(settings.validate().is_err());
    }
}
