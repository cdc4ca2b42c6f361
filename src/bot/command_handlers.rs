//! Command Handlers module for processing bot commands

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use super::outbound::Outbound;
use super::ui_builder::create_order_keyboard;
use super::HandlerContext;
use crate::localization::t_lang;
use crate::observability;

/// Handle the /start command: greet and offer the order mini-application
pub async fn handle_start_command<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    chat_id: ChatId,
    web_app_url: &reqwest::Url,
) -> Result<()> {
    debug!(chat_id = %chat_id, "Handling /start command");
    observability::record_command("start");

    let keyboard = create_order_keyboard(
        t_lang(ctx.localization, "order-button", ctx.language_code),
        web_app_url.clone(),
    );
    ctx.outbound
        .send_keyboard(
            chat_id,
            t_lang(ctx.localization, "welcome", ctx.language_code),
            keyboard,
        )
        .await
}

/// Handle the /help command
pub async fn handle_help_command<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    chat_id: ChatId,
) -> Result<()> {
    debug!(chat_id = %chat_id, "Handling /help command");
    observability::record_command("help");

    ctx.outbound
        .send_text(chat_id, t_lang(ctx.localization, "help", ctx.language_code))
        .await
}
