//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `command_handlers`: /start and /help
//! - `order_handler`: mini-application data to invoice
//! - `payment_handlers`: pre-checkout approval and payment confirmation
//! - `outbound`: the channel handlers send replies through
//! - `ui_builder`: keyboards
//!
//! [`schema`] is the routing table wiring update kinds to these handlers.

pub mod command_handlers;
pub mod order_handler;
pub mod outbound;
pub mod payment_handlers;
pub mod ui_builder;

use std::sync::Arc;

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::PreCheckoutQuery;
use teloxide::utils::command::BotCommands;
use tracing::debug;

use crate::config::PaymentConfig;
use crate::localization::LocalizationManager;
use crate::orders::InvoiceSettings;
use crate::tariffs::TariffCatalogue;

pub use command_handlers::{handle_help_command, handle_start_command};
pub use order_handler::{handle_web_app_order, OrderIntake};
pub use outbound::Outbound;
pub use payment_handlers::{handle_pre_checkout, handle_successful_payment};

/// Common context for bot handlers containing shared dependencies
#[derive(Debug)]
pub struct HandlerContext<'a, O> {
    pub outbound: &'a O,
    pub localization: &'a LocalizationManager,
    pub language_code: Option<&'a str>,
}

/// Dependencies injected into every endpoint
#[derive(Debug, Clone)]
pub struct HandlerDeps {
    pub catalogue: Arc<TariffCatalogue>,
    pub localization: Arc<LocalizationManager>,
    pub payment: Arc<PaymentConfig>,
    pub web_app_url: reqwest::Url,
}

impl HandlerDeps {
    fn invoice_settings(&self) -> InvoiceSettings<'_> {
        InvoiceSettings {
            provider_token: &self.payment.provider_token,
            start_parameter: &self.payment.start_parameter,
        }
    }
}

/// Supported commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "start ordering an ad placement")]
    Start,
    #[command(description = "show help")]
    Help,
}

/// Kinds of incoming messages the bot reacts to, besides commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    SuccessfulPayment,
    WebAppData,
}

/// Classify a message; payment notifications win over mini-application data
pub fn classify_message(msg: &Message) -> Option<MessageKind> {
    if msg.successful_payment().is_some() {
        Some(MessageKind::SuccessfulPayment)
    } else if msg.web_app_data().is_some() {
        Some(MessageKind::WebAppData)
    } else {
        None
    }
}

/// Error type returned by endpoints to the dispatcher
pub type HandlerError = anyhow::Error;

/// Build the routing table: update kind to handler
pub fn schema() -> UpdateHandler<HandlerError> {
    let messages = Update::filter_message()
        .branch(
            dptree::filter(|msg: Message| {
                classify_message(&msg) == Some(MessageKind::SuccessfulPayment)
            })
            .endpoint(successful_payment_endpoint),
        )
        .branch(
            dptree::filter(|msg: Message| classify_message(&msg) == Some(MessageKind::WebAppData))
                .endpoint(web_app_data_endpoint),
        )
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(command_endpoint),
        );

    dptree::entry()
        .branch(messages)
        .branch(Update::filter_pre_checkout_query().endpoint(pre_checkout_endpoint))
}

fn message_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

async fn command_endpoint(
    bot: Bot,
    msg: Message,
    cmd: Command,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let ctx = HandlerContext {
        outbound: &bot,
        localization: &deps.localization,
        language_code: message_language(&msg),
    };

    match cmd {
        Command::Start => handle_start_command(&ctx, msg.chat.id, &deps.web_app_url).await,
        Command::Help => handle_help_command(&ctx, msg.chat.id).await,
    }
}

async fn web_app_data_endpoint(
    bot: Bot,
    msg: Message,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(web_app_data) = msg.web_app_data() else {
        return Ok(());
    };

    let ctx = HandlerContext {
        outbound: &bot,
        localization: &deps.localization,
        language_code: message_language(&msg),
    };
    let intake = OrderIntake {
        catalogue: &deps.catalogue,
        invoice_settings: deps.invoice_settings(),
    };

    // Failures are answered and logged inside, never surfaced to the dispatcher
    match handle_web_app_order(&ctx, msg.chat.id, &web_app_data.data, intake).await {
        Ok(payload) => debug!(plan = %payload.plan, "Order intake finished"),
        Err(e) => debug!(kind = e.kind(), "Order intake finished without invoice"),
    }
    Ok(())
}

async fn successful_payment_endpoint(
    bot: Bot,
    msg: Message,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(payment) = msg.successful_payment() else {
        return Ok(());
    };

    let ctx = HandlerContext {
        outbound: &bot,
        localization: &deps.localization,
        language_code: message_language(&msg),
    };

    handle_successful_payment(
        &ctx,
        msg.chat.id,
        &payment.invoice_payload,
        payment.total_amount as u64,
        &deps.catalogue,
    )
    .await
}

async fn pre_checkout_endpoint(
    bot: Bot,
    query: PreCheckoutQuery,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let ctx = HandlerContext {
        outbound: &bot,
        localization: &deps.localization,
        language_code: query.from.language_code.as_deref(),
    };

    handle_pre_checkout(
        &ctx,
        &query,
        &deps.catalogue,
        deps.payment.validate_pre_checkout,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn message(extra: Value) -> Message {
        let mut value = json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": {"id": 4242, "type": "private", "first_name": "Test"},
            "from": {"id": 4242, "is_bot": false, "first_name": "Test", "language_code": "ru"}
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).expect("valid message")
    }

    fn successful_payment() -> Value {
        json!({
            "currency": "RUB",
            "total_amount": 10000,
            "invoice_payload": r#"{"plan":"1 месяц","months":1,"user_id":42}"#,
            "order_info": {},
            "telegram_payment_charge_id": "tg-charge",
            "provider_payment_charge_id": "provider-charge"
        })
    }

    fn web_app_data() -> Value {
        json!({"data": r#"{"plan":"1 месяц","user_id":42}"#, "button_text": "✨ Заказать рекламу"})
    }

    #[test]
    fn test_handler_deps_are_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<HandlerDeps>();
        assert_send_sync::<LocalizationManager>();
    }

    #[test]
    fn test_successful_payment_goes_to_confirmation() {
        let msg = message(json!({ "successful_payment": successful_payment() }));
        assert_eq!(classify_message(&msg), Some(MessageKind::SuccessfulPayment));
    }

    #[test]
    fn test_web_app_data_goes_to_order_intake() {
        let msg = message(json!({ "web_app_data": web_app_data() }));
        assert_eq!(classify_message(&msg), Some(MessageKind::WebAppData));
    }

    #[test]
    fn test_payment_wins_over_web_app_data() {
        let msg = message(json!({
            "successful_payment": successful_payment(),
            "web_app_data": web_app_data()
        }));

        // Telegram never sends both; whatever the message holds, a payment is confirmed first
        let expected = if msg.successful_payment().is_some() {
            MessageKind::SuccessfulPayment
        } else {
            MessageKind::WebAppData
        };
        assert_eq!(classify_message(&msg), Some(expected));
    }

    #[test]
    fn test_plain_text_is_not_routed() {
        let msg = message(json!({ "text": "hello" }));
        assert_eq!(classify_message(&msg), None);

        let msg = message(json!({ "text": "/start" }));
        assert_eq!(classify_message(&msg), None);
    }

    #[test]
    fn test_commands_parse() {
        assert_eq!(Command::parse("/start", "ad_bot").ok(), Some(Command::Start));
        assert_eq!(Command::parse("/help", "ad_bot").ok(), Some(Command::Help));
        assert!(Command::parse("/order", "ad_bot").is_err());
    }

    #[test]
    fn test_routing_table_builds() {
        let _handler = schema();
    }
}
