use ad_placement_bot::bot::{self, HandlerDeps};
use ad_placement_bot::config::AppConfig;
use ad_placement_bot::errors::error_logging;
use ad_placement_bot::localization;
use ad_placement_bot::observability;
use ad_placement_bot::tariffs;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Logging comes up before the remaining validation so failures are visible
    let tracer_provider = observability::init_logging(&config.observability)?;

    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "app_config", "validate");
        return Err(e.into());
    }
    info!("{}", config.summary());

    let catalogue = Arc::new(
        tariffs::load_tariff_catalogue(config.tariffs_path.as_deref()).inspect_err(|e| {
            error_logging::log_config_error(e, tariffs::TARIFFS_CONFIG_PATH_ENV, "load_tariff_catalogue")
        })?,
    );
    info!(
        tariffs = catalogue.tariffs().len(),
        currency = %catalogue.currency(),
        "Tariff catalogue ready"
    );

    observability::init_observability(
        &config.observability,
        config.bot.token.clone(),
        Arc::clone(&catalogue),
    )
    .await?;

    let localization_manager = localization::load_localization_manager(config.locales_dir.as_deref())
        .inspect_err(|e| {
            error_logging::log_config_error(e, localization::LOCALES_DIR_ENV, "load_locales")
        })?;

    let web_app_url = reqwest::Url::parse(&config.bot.web_app_url)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;
    let bot = Bot::with_client(config.bot.token.clone(), client);

    info!(
        timeout_secs = config.bot.http_timeout_secs,
        "Bot initialized, starting dispatcher"
    );

    let deps = HandlerDeps {
        catalogue,
        localization: localization_manager,
        payment: Arc::new(config.payment.clone()),
        web_app_url,
    };

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![deps])
        .default_handler(|upd: Arc<Update>| async move {
            debug!(update_id = ?upd.id, "Ignoring unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            warn!(error = %e, "Failed to flush pending spans");
        }
    }

    Ok(())
}
