//! Order intake handler: mini-application data in, invoice out.

use teloxide::prelude::*;
use tracing::{info, warn, Instrument};

use super::outbound::Outbound;
use super::HandlerContext;
use crate::errors::error_logging;
use crate::localization::{t_args_lang, t_lang};
use crate::observability;
use crate::orders::{build_invoice, parse_order_request, InvoicePayload, InvoiceSettings, OrderError};
use crate::tariffs::TariffCatalogue;

/// Inputs of the order intake handler besides the handler context
#[derive(Debug, Clone, Copy)]
pub struct OrderIntake<'a> {
    pub catalogue: &'a TariffCatalogue,
    pub invoice_settings: InvoiceSettings<'a>,
}

/// Turn mini-application data into an invoice.
///
/// Every outcome is answered: the invoice itself on success, otherwise the
/// localized message for the failure kind. The returned result tells callers
/// which path was taken; it is never propagated to the dispatcher.
pub async fn handle_web_app_order<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    chat_id: ChatId,
    data: &str,
    intake: OrderIntake<'_>,
) -> Result<InvoicePayload, OrderError> {
    let span = observability::telegram_span("web_app_order", chat_id.0);
    async move {
        info!(data_len = data.len(), "Received mini-application data");

        let result = issue_invoice(ctx, chat_id, data, intake).await;

        match &result {
            Ok(payload) => {
                observability::record_order("success");
                info!(plan = %payload.plan, months = payload.months, "Invoice issued");
            }
            Err(e) => {
                observability::record_order(e.kind());
                match e {
                    OrderError::Dispatch(_) => {
                        error_logging::log_order_error(e, chat_id.0, None, Some(data))
                    }
                    _ => warn!(error = %e, "Rejected order"),
                }

                let reply = t_lang(ctx.localization, e.message_key(), ctx.language_code);
                if let Err(send_err) = ctx.outbound.send_text(chat_id, reply).await {
                    error_logging::log_network_error(&send_err, "send_order_error", Some(chat_id.0));
                }
            }
        }

        result
    }
    .instrument(span)
    .await
}

async fn issue_invoice<O: Outbound>(
    ctx: &HandlerContext<'_, O>,
    chat_id: ChatId,
    data: &str,
    intake: OrderIntake<'_>,
) -> Result<InvoicePayload, OrderError> {
    let order = parse_order_request(data)?;

    let invoice = build_invoice(intake.catalogue, &order, intake.invoice_settings, |plan| {
        t_args_lang(ctx.localization, "invoice-title", &[("plan", plan)], ctx.language_code)
    })?;

    ctx.outbound
        .send_invoice_request(chat_id, &invoice)
        .await
        .map_err(|e| OrderError::Dispatch(e.to_string()))?;

    observability::record_invoice_issued(&invoice.payload.plan);
    Ok(invoice.payload)
}
