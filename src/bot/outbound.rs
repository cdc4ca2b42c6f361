//! Outbound channel used by the handlers.
//!
//! Handlers talk to Telegram only through [`Outbound`], which keeps them
//! independent of the network client and lets tests record what would be sent.

use anyhow::Result;
use std::future::Future;
use teloxide::prelude::*;
use teloxide::types::{KeyboardMarkup, LabeledPrice, ParseMode, PreCheckoutQuery};

use crate::orders::InvoiceRequest;

/// Everything the handlers send back to the platform
pub trait Outbound: Send + Sync {
    /// Send a plain text message
    fn send_text(&self, chat_id: ChatId, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Send a message formatted with Telegram HTML
    fn send_html(&self, chat_id: ChatId, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Send a message with a reply keyboard
    fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: KeyboardMarkup,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Issue a payment invoice
    fn send_invoice_request(
        &self,
        chat_id: ChatId,
        invoice: &InvoiceRequest,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Answer a pre-checkout query, with a user-facing reason when rejecting
    fn answer_pre_checkout(
        &self,
        query: &PreCheckoutQuery,
        error_message: Option<String>,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl Outbound for Bot {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: KeyboardMarkup,
    ) -> Result<()> {
        self.send_message(chat_id, text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn send_invoice_request(&self, chat_id: ChatId, invoice: &InvoiceRequest) -> Result<()> {
        let payload = invoice.payload.encode()?;
        let prices: Vec<LabeledPrice> = invoice
            .prices
            .iter()
            .map(|line| LabeledPrice {
                label: line.label.clone(),
                amount: line.amount,
            })
            .collect();

        self.send_invoice(
            chat_id,
            invoice.title.clone(),
            invoice.description.clone(),
            payload,
            invoice.currency.clone(),
            prices,
        )
        .provider_token(invoice.provider_token.clone())
        .start_parameter(invoice.start_parameter.clone())
        .await?;
        Ok(())
    }

    async fn answer_pre_checkout(
        &self,
        query: &PreCheckoutQuery,
        error_message: Option<String>,
    ) -> Result<()> {
        match error_message {
            None => {
                self.answer_pre_checkout_query(query.id.clone(), true).await?;
            }
            Some(message) => {
                self.answer_pre_checkout_query(query.id.clone(), false)
                    .error_message(message)
                    .await?;
            }
        }
        Ok(())
    }
}
