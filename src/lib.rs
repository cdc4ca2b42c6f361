//! # Ad Placement Bot
//!
//! A Telegram bot that sells ad placement tariffs: the user picks a plan in an
//! embedded mini-application, receives an invoice from the payment provider
//! and gets a confirmation once the payment succeeds.

pub mod bot;
pub mod config;
pub mod errors;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod orders;
pub mod payments;
pub mod tariffs;

// Re-export types for easier access
pub use orders::{InvoicePayload, InvoiceRequest, OrderError, OrderRequest};
pub use tariffs::{Tariff, TariffCatalogue};
