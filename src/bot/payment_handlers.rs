//! Payment Confirmation handlers: pre-checkout approval and successful
//! payment acknowledgement.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::PreCheckoutQuery;
use tracing::{info, warn};

use super::outbound::Outbound;
use super::HandlerContext;
use crate::errors::error_logging;
use crate::localization::t_lang;
use crate::observability;
use crate::payments::{review_pre_checkout, PaymentConfirmation, PreCheckoutDecision, PreCheckoutDetails};
use crate::tariffs::TariffCatalogue;

/// Review and answer a pre-checkout query
pub async fn handle_pre_checkout<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    query: &PreCheckoutQuery,
    catalogue: &TariffCatalogue,
    strict: bool,
) -> Result<PreCheckoutDecision> {
    let decision = review_pre_checkout(
        catalogue,
        PreCheckoutDetails {
            invoice_payload: &query.invoice_payload,
            currency: &query.currency,
            total_amount: query.total_amount as u64,
        },
        strict,
    );

    observability::record_pre_checkout(decision.is_approved());

    let error_message = match &decision {
        PreCheckoutDecision::Approve => {
            info!(user_id = %query.from.id, total_amount = query.total_amount, "Pre-checkout approved");
            None
        }
        PreCheckoutDecision::Reject(reason) => {
            warn!(user_id = %query.from.id, reason = %reason, "Pre-checkout rejected");
            Some(t_lang(ctx.localization, "pre-checkout-rejected", ctx.language_code))
        }
    };

    ctx.outbound.answer_pre_checkout(query, error_message).await?;
    Ok(decision)
}

/// Acknowledge a completed payment.
///
/// A payload that cannot be decoded still gets a positive acknowledgement,
/// the user is never left without confirmation that the payment went through.
pub async fn handle_successful_payment<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    chat_id: ChatId,
    invoice_payload: &str,
    total_amount: u64,
    catalogue: &TariffCatalogue,
) -> Result<()> {
    match PaymentConfirmation::from_successful_payment(catalogue, invoice_payload, total_amount) {
        Ok(confirmation) => {
            info!(
                chat_id = %chat_id,
                plan = %confirmation.payload.plan,
                months = confirmation.payload.months,
                amount = confirmation.amount,
                "Payment received"
            );
            observability::record_payment(Some(&confirmation.payload.plan), confirmation.amount);

            let text = confirmation.render_html(ctx.localization, ctx.language_code);
            if let Err(e) = ctx.outbound.send_html(chat_id, text).await {
                // formatting may be rejected by Telegram, the plain fallback still confirms
                warn!(chat_id = %chat_id, error = %e, "Confirmation rejected, sending fallback");
                send_fallback_confirmation(ctx, chat_id).await?;
            }
        }
        Err(e) => {
            error_logging::log_payment_error(
                &e,
                "decode_invoice_payload",
                Some(chat_id.0),
                Some(invoice_payload),
            );
            observability::record_payment(None, catalogue.amount_in_units(total_amount));
            send_fallback_confirmation(ctx, chat_id).await?;
        }
    }

    Ok(())
}

async fn send_fallback_confirmation<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    chat_id: ChatId,
) -> Result<()> {
    ctx.outbound
        .send_text(
            chat_id,
            t_lang(ctx.localization, "payment-success-fallback", ctx.language_code),
        )
        .await
}
