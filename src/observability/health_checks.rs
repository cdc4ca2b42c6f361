//! Health check functionality module.
//!
//! Readiness means the bot can serve orders: a well-formed token and a
//! non-empty tariff catalogue.

use anyhow::Result;

use crate::tariffs::TariffCatalogue;

/// Perform all readiness checks
pub fn perform_readiness_checks(bot_token: &str, catalogue: &TariffCatalogue) -> Result<()> {
    check_bot_token_health(bot_token)?;
    check_catalogue_health(catalogue)?;
    Ok(())
}

/// Check the bot token format without calling the Telegram API
pub fn check_bot_token_health(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(anyhow::anyhow!("Bot token is empty"));
    }

    if !token.contains(':') {
        return Err(anyhow::anyhow!("Bot token format is invalid"));
    }

    tracing::debug!("Bot token health check passed");
    Ok(())
}

/// Check that there is something to sell
pub fn check_catalogue_health(catalogue: &TariffCatalogue) -> Result<()> {
    catalogue
        .validate()
        .map_err(|e| anyhow::anyhow!("Tariff catalogue health check failed: {}", e))?;

    tracing::debug!(tariffs = catalogue.tariffs().len(), "Catalogue health check passed");
    Ok(())
}
