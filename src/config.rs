//! # Unified Application Configuration
//!
//! Collects every setting the bot needs into a single structured object.
//! Values come from environment variables (a `.env` file is loaded first by
//! `main`), are validated once at startup and then passed explicitly to the
//! components that need them.

use crate::errors::{AppError, AppResult};
use crate::localization::LOCALES_DIR_ENV;
use crate::observability_config::ObservabilityConfig;
use crate::orders::DEFAULT_START_PARAMETER;
use crate::tariffs::TARIFFS_CONFIG_PATH_ENV;
use std::env;

/// Mini-application opened by the order button
pub const DEFAULT_WEB_APP_URL: &str = "https://goltsofficial.github.io/telegram_seller_assistant/";

/// Bot-specific configuration settings
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
    /// URL of the order mini-application
    pub web_app_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
            web_app_url: DEFAULT_WEB_APP_URL.to_string(),
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("Bot token cannot be empty".to_string()));
        }

        // Telegram bot tokens look like "<numeric bot id>:<secret>"
        let Some((bot_id, secret)) = self.token.split_once(':') else {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        };

        if secret.contains(':') {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        }

        if bot_id.parse::<u64>().is_err() {
            return Err(AppError::Config("Bot token bot ID must be numeric".to_string()));
        }

        if secret.len() < 20 {
            return Err(AppError::Config(
                "Bot token appears to be too short. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout cannot be greater than 300 seconds".to_string(),
            ));
        }

        match reqwest::Url::parse(&self.web_app_url) {
            Ok(url) if url.scheme() == "https" => {}
            Ok(_) => {
                return Err(AppError::Config(
                    "Web app URL must use https, Telegram refuses other schemes".to_string(),
                ))
            }
            Err(e) => {
                return Err(AppError::Config(format!("Web app URL is invalid: {}", e)));
            }
        }

        Ok(())
    }
}

/// Payment provider settings
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Provider credential issued through BotFather
    pub provider_token: String,
    /// Start parameter attached to invoices
    pub start_parameter: String,
    /// Re-check pre-checkout queries against the catalogue instead of approving them all
    pub validate_pre_checkout: bool,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            provider_token: String::new(),
            start_parameter: DEFAULT_START_PARAMETER.to_string(),
            validate_pre_checkout: false,
        }
    }
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.provider_token.trim().is_empty() {
            return Err(AppError::Config(
                "Payment provider token cannot be empty".to_string(),
            ));
        }

        // Deep-link start parameters are limited to 1-64 chars of [A-Za-z0-9_-]
        if self.start_parameter.is_empty()
            || self.start_parameter.len() > 64
            || !self
                .start_parameter
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::Config(format!(
                "Invoice start parameter '{}' is invalid",
                self.start_parameter
            )));
        }

        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// Payment configuration
    pub payment: PaymentConfig,
    /// Explicit tariff catalogue file, if any
    pub tariffs_path: Option<String>,
    /// Directory overriding the built-in locale files, if any
    pub locales_dir: Option<String>,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut config = Self::default();

        config.bot.token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .ok_or_else(|| {
                AppError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        config.bot.http_timeout_secs = lookup("HTTP_CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| {
                AppError::Config("HTTP_CLIENT_TIMEOUT_SECS must be a valid number".to_string())
            })?;
        if let Some(url) = lookup("WEB_APP_URL") {
            config.bot.web_app_url = url;
        }

        config.payment.provider_token = lookup("PAYMENT_PROVIDER_TOKEN").ok_or_else(|| {
            AppError::Config("PAYMENT_PROVIDER_TOKEN environment variable is required".to_string())
        })?;
        if let Some(start_parameter) = lookup("INVOICE_START_PARAMETER") {
            config.payment.start_parameter = start_parameter;
        }
        config.payment.validate_pre_checkout = lookup("PRE_CHECKOUT_VALIDATION")
            .unwrap_or_else(|| "false".to_string())
            .to_lowercase()
            == "true";

        config.tariffs_path = lookup(TARIFFS_CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty());

        config.locales_dir = lookup(LOCALES_DIR_ENV).filter(|p| !p.trim().is_empty());

        config.observability = ObservabilityConfig::from_lookup(&lookup);

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.payment.validate()?;
        self.observability
            .validate()
            .map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: bot_token=[REDACTED], provider_token=[REDACTED], web_app_url={}, pre_checkout_validation={}, tariffs_path={}, metrics_port={}",
            self.bot.web_app_url,
            self.payment.validate_pre_checkout,
            self.tariffs_path.as_deref().unwrap_or("<default>"),
            self.observability.metrics_port,
        )
    }
}
