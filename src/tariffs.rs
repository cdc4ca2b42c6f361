//! # Tariff Catalogue
//!
//! The catalogue of ad placement plans offered through the mini-application.
//! It is loaded once at startup, validated, and then shared read-only
//! between handlers behind an `Arc`.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable pointing at an explicit catalogue file
pub const TARIFFS_CONFIG_PATH_ENV: &str = "TARIFFS_CONFIG_PATH";

/// A single ad placement plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    /// Human-readable plan name, also the lookup key sent by the mini-application
    pub name: String,
    /// Placement duration in months
    pub months: u32,
    /// Price in whole currency units
    pub price: u32,
    /// Description shown on the invoice
    pub description: String,
}

/// Immutable set of tariffs priced in a single currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffCatalogue {
    /// ISO 4217 currency code used for every invoice
    currency: String,
    /// How many provider subunits make one currency unit (100 for kopecks)
    subunits_per_unit: u32,
    tariffs: Vec<Tariff>,
}

impl Default for TariffCatalogue {
    fn default() -> Self {
        let tariff = |name: &str, months: u32, price: u32, description: &str| Tariff {
            name: name.to_string(),
            months,
            price,
            description: description.to_string(),
        };

        Self {
            currency: "RUB".to_string(),
            subunits_per_unit: 100,
            tariffs: vec![
                tariff("1 месяц", 1, 100, "Размещение на 1 месяц"),
                tariff("3 месяца", 3, 250, "Размещение на 3 месяца"),
                tariff("6 месяцев", 6, 450, "Размещение на 6 месяцев"),
                tariff("1 год", 12, 800, "Размещение на 1 год"),
            ],
        }
    }
}

impl TariffCatalogue {
    /// Build a validated catalogue
    pub fn new(
        currency: impl Into<String>,
        subunits_per_unit: u32,
        tariffs: Vec<Tariff>,
    ) -> AppResult<Self> {
        let catalogue = Self {
            currency: currency.into(),
            subunits_per_unit,
            tariffs,
        };
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Parse and validate a catalogue from its JSON representation
    pub fn from_json(content: &str) -> AppResult<Self> {
        let catalogue: Self = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("Invalid tariff catalogue JSON: {}", e)))?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Validate catalogue invariants
    pub fn validate(&self) -> AppResult<()> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AppError::Validation(format!(
                "Currency '{}' must be a 3-letter upper-case ISO 4217 code",
                self.currency
            )));
        }

        if self.subunits_per_unit == 0 {
            return Err(AppError::Validation(
                "Subunits per currency unit cannot be 0".to_string(),
            ));
        }

        if self.tariffs.is_empty() {
            return Err(AppError::Validation(
                "Tariff catalogue cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for tariff in &self.tariffs {
            if tariff.name.trim().is_empty() {
                return Err(AppError::Validation("Tariff name cannot be empty".to_string()));
            }
            if !seen.insert(tariff.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate tariff name '{}'",
                    tariff.name
                )));
            }
            if tariff.months == 0 {
                return Err(AppError::Validation(format!(
                    "Tariff '{}' must last at least one month",
                    tariff.name
                )));
            }
            if tariff.price == 0 {
                return Err(AppError::Validation(format!(
                    "Tariff '{}' must have a positive price",
                    tariff.name
                )));
            }
            if tariff.price.checked_mul(self.subunits_per_unit).is_none() {
                return Err(AppError::Validation(format!(
                    "Tariff '{}' price {} overflows the provider amount range",
                    tariff.name, tariff.price
                )));
            }
        }

        Ok(())
    }

    /// Look a tariff up by its exact plan name
    pub fn get(&self, plan: &str) -> Option<&Tariff> {
        self.tariffs.iter().find(|tariff| tariff.name == plan)
    }

    /// All tariffs in catalogue order
    pub fn tariffs(&self) -> &[Tariff] {
        &self.tariffs
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn subunits_per_unit(&self) -> u32 {
        self.subunits_per_unit
    }

    /// Invoice amount for a tariff in provider subunits
    pub fn amount_in_subunits(&self, tariff: &Tariff) -> u32 {
        // validate() guarantees this cannot overflow for catalogue entries
        tariff.price.saturating_mul(self.subunits_per_unit)
    }

    /// Convert a provider amount back to whole currency units (truncating)
    pub fn amount_in_units(&self, subunits: u64) -> u64 {
        subunits / u64::from(self.subunits_per_unit)
    }
}

/// Load the tariff catalogue from a JSON file
pub fn load_tariff_catalogue_from_path(path: impl AsRef<Path>) -> AppResult<TariffCatalogue> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!(
            "Failed to read tariff catalogue '{}': {}",
            path.display(),
            e
        ))
    })?;
    TariffCatalogue::from_json(&content)
}

/// Load the tariff catalogue used by the bot.
///
/// An explicit path (usually from `TARIFFS_CONFIG_PATH`) must load successfully.
/// Without one, the conventional locations are tried and the built-in
/// catalogue is used when none of them exists.
pub fn load_tariff_catalogue(explicit_path: Option<&str>) -> AppResult<TariffCatalogue> {
    if let Some(config_path) = explicit_path {
        info!(path = %config_path, "Loading tariff catalogue from configured path");
        return load_tariff_catalogue_from_path(config_path);
    }

    let possible_paths = [
        "/app/config/tariffs.json", // Docker path
        "config/tariffs.json",      // Local development path
    ];

    for config_path in &possible_paths {
        if !Path::new(config_path).exists() {
            continue;
        }
        match load_tariff_catalogue_from_path(config_path) {
            Ok(catalogue) => {
                info!(
                    path = %config_path,
                    tariffs = catalogue.tariffs().len(),
                    "Loaded tariff catalogue"
                );
                return Ok(catalogue);
            }
            Err(e) => {
                warn!(path = %config_path, error = %e, "Ignoring unreadable tariff catalogue");
            }
        }
    }

    info!("No tariff catalogue file found, using built-in tariffs");
    Ok(TariffCatalogue::default())
}
