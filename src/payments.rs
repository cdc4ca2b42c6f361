//! Payment confirmation: pre-checkout review and the message sent once the
//! provider reports a successful payment.

use teloxide::utils::html;

use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::orders::{display_scalar, InvoicePayload};
use crate::tariffs::TariffCatalogue;

/// Outcome of reviewing a pre-checkout query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheckoutDecision {
    Approve,
    /// Reject with a reason for the operator log
    Reject(String),
}

impl PreCheckoutDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, PreCheckoutDecision::Approve)
    }
}

/// Fields of a pre-checkout query relevant to the review
#[derive(Debug, Clone, Copy)]
pub struct PreCheckoutDetails<'a> {
    pub invoice_payload: &'a str,
    pub currency: &'a str,
    pub total_amount: u64,
}

/// Decide whether to approve a pre-checkout query.
///
/// Without `strict`, every query is approved. With it, the payload must still
/// describe a catalogue tariff and the amount and currency must match it.
pub fn review_pre_checkout(
    catalogue: &TariffCatalogue,
    details: PreCheckoutDetails<'_>,
    strict: bool,
) -> PreCheckoutDecision {
    if !strict {
        return PreCheckoutDecision::Approve;
    }

    let payload = match InvoicePayload::decode(details.invoice_payload) {
        Ok(payload) => payload,
        Err(e) => return PreCheckoutDecision::Reject(format!("undecodable payload: {}", e)),
    };

    let Some(tariff) = catalogue.get(&payload.plan) else {
        return PreCheckoutDecision::Reject(format!("tariff '{}' no longer offered", payload.plan));
    };

    if tariff.months != payload.months {
        return PreCheckoutDecision::Reject(format!(
            "tariff '{}' now lasts {} months, payload says {}",
            tariff.name, tariff.months, payload.months
        ));
    }

    if details.currency != catalogue.currency() {
        return PreCheckoutDecision::Reject(format!(
            "currency {} does not match {}",
            details.currency,
            catalogue.currency()
        ));
    }

    let expected = u64::from(catalogue.amount_in_subunits(tariff));
    if details.total_amount != expected {
        return PreCheckoutDecision::Reject(format!(
            "amount {} does not match current price {}",
            details.total_amount, expected
        ));
    }

    PreCheckoutDecision::Approve
}

/// Decoded data behind a confirmation message
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub payload: InvoicePayload,
    /// Paid amount in whole currency units
    pub amount: u64,
    /// ISO 4217 code of the catalogue the invoice was priced in
    pub currency: String,
}

impl PaymentConfirmation {
    /// Decode the echoed invoice payload of a successful payment
    pub fn from_successful_payment(
        catalogue: &TariffCatalogue,
        invoice_payload: &str,
        total_amount: u64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            payload: InvoicePayload::decode(invoice_payload)?,
            amount: catalogue.amount_in_units(total_amount),
            currency: catalogue.currency().to_string(),
        })
    }

    /// Render the confirmation as Telegram HTML
    pub fn render_html(
        &self,
        localization: &LocalizationManager,
        language_code: Option<&str>,
    ) -> String {
        let months = self.payload.months.to_string();
        let amount = self.amount.to_string();
        let order_id = display_scalar(&self.payload.user_id);

        format!(
            "✅ {}\n\n{} {}\n{} {}\n{} {}\n\n{}\n{}",
            html::bold(&html::escape(&t_lang(localization, "payment-thanks", language_code))),
            html::bold(&t_lang(localization, "payment-plan", language_code)),
            html::escape(&self.payload.plan),
            html::bold(&t_lang(localization, "payment-duration", language_code)),
            html::escape(&t_args_lang(
                localization,
                "payment-duration-value",
                &[("months", &months)],
                language_code
            )),
            html::bold(&t_lang(localization, "payment-amount", language_code)),
            html::escape(&t_args_lang(
                localization,
                "payment-amount-value",
                &[("amount", &amount), ("currency", &self.currency)],
                language_code
            )),
            html::escape(&t_lang(localization, "payment-contact", language_code)),
            html::escape(&t_args_lang(
                localization,
                "payment-order-id",
                &[("order_id", &order_id)],
                language_code
            )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_json(plan: &str, months: u32) -> String {
        json!({"plan": plan, "months": months, "user_id": 42}).to_string()
    }

    fn details<'a>(payload: &'a str, currency: &'static str, total_amount: u64) -> PreCheckoutDetails<'a> {
        PreCheckoutDetails {
            invoice_payload: payload,
            currency,
            total_amount,
        }
    }

    #[test]
    fn test_lenient_review_approves_anything() {
        let catalogue = TariffCatalogue::default();
        let decision = review_pre_checkout(&catalogue, details("garbage", "XTR", 1), false);
        assert_eq!(decision, PreCheckoutDecision::Approve);
    }

    #[test]
    fn test_strict_review_approves_matching_query() {
        let catalogue = TariffCatalogue::default();
        let payload = payload_json("6 месяцев", 6);
        let decision = review_pre_checkout(&catalogue, details(&payload, "RUB", 45000), true);
        assert!(decision.is_approved());
    }

    #[test]
    fn test_strict_review_rejections() {
        let catalogue = TariffCatalogue::default();

        let decision = review_pre_checkout(&catalogue, details("{", "RUB", 10000), true);
        assert!(!decision.is_approved());

        let payload = payload_json("2 месяца", 2);
        let decision = review_pre_checkout(&catalogue, details(&payload, "RUB", 10000), true);
        assert!(!decision.is_approved());

        let payload = payload_json("1 месяц", 3);
        let decision = review_pre_checkout(&catalogue, details(&payload, "RUB", 10000), true);
        assert!(!decision.is_approved());

        let payload = payload_json("1 месяц", 1);
        let decision = review_pre_checkout(&catalogue, details(&payload, "USD", 10000), true);
        assert!(!decision.is_approved());

        let decision = review_pre_checkout(&catalogue, details(&payload, "RUB", 9900), true);
        assert!(!decision.is_approved());
    }

    #[test]
    fn test_confirmation_amount_uses_integer_division() {
        let catalogue = TariffCatalogue::default();
        let confirmation = PaymentConfirmation::from_successful_payment(
            &catalogue,
            &payload_json("1 год", 12),
            80050,
        )
        .unwrap();
        assert_eq!(confirmation.amount, 800);
        assert_eq!(confirmation.payload.months, 12);
    }

    #[test]
    fn test_confirmation_shows_catalogue_currency() {
        let localization = crate::localization::create_localization_manager().unwrap();
        let catalogue = TariffCatalogue::new(
            "EUR",
            100,
            vec![crate::tariffs::Tariff {
                name: "weekend".to_string(),
                months: 1,
                price: 15,
                description: "Weekend placement".to_string(),
            }],
        )
        .unwrap();

        let confirmation = PaymentConfirmation::from_successful_payment(
            &catalogue,
            &payload_json("weekend", 1),
            1500,
        )
        .unwrap();

        let russian = confirmation.render_html(&localization, Some("ru"));
        assert!(russian.contains("15 EUR"));
        assert!(!russian.contains("руб."));
        assert!(confirmation
            .render_html(&localization, Some("en"))
            .contains("15 EUR"));

        let rubles = PaymentConfirmation::from_successful_payment(
            &TariffCatalogue::default(),
            &payload_json("1 месяц", 1),
            10000,
        )
        .unwrap();
        assert!(rubles.render_html(&localization, Some("ru")).contains("100 руб."));
        assert!(rubles.render_html(&localization, Some("en")).contains("100 RUB"));
    }

    #[test]
    fn test_confirmation_rejects_bad_payload() {
        let catalogue = TariffCatalogue::default();
        assert!(PaymentConfirmation::from_successful_payment(&catalogue, "oops", 100).is_err());
        assert!(PaymentConfirmation::from_successful_payment(
            &catalogue,
            r#"{"plan": "1 год"}"#,
            100
        )
        .is_err());
    }
}
