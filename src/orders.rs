//! Order intake: turns the JSON blob sent by the mini-application into an
//! invoice request priced from the tariff catalogue.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::tariffs::TariffCatalogue;

/// Default start parameter attached to invoices
pub const DEFAULT_START_PARAMETER: &str = "create_invoice";

/// Order submitted by the mini-application
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    /// Requested plan name, `None` when the client omitted it or sent a non-string
    pub plan: Option<String>,
    /// Client-supplied user identifier, `Value::Null` when absent
    pub user_id: Value,
}

/// Order context attached to the invoice and echoed back on payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayload {
    pub plan: String,
    pub months: u32,
    pub user_id: Value,
}

impl InvoicePayload {
    /// Serialize for the invoice `payload` field
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the payload echoed back by the payment provider
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// A single priced line of an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLine {
    pub label: String,
    /// Amount in provider subunits
    pub amount: u32,
}

/// Everything needed to issue an invoice through the Telegram payments API
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    pub title: String,
    pub description: String,
    pub payload: InvoicePayload,
    pub provider_token: String,
    pub currency: String,
    pub prices: Vec<PriceLine>,
    pub start_parameter: String,
}

impl InvoiceRequest {
    /// Sum of all price lines in provider subunits
    pub fn total_amount(&self) -> u64 {
        self.prices.iter().map(|line| u64::from(line.amount)).sum()
    }
}

/// Why an order did not turn into an invoice
#[derive(Debug, Clone, PartialEq)]
pub enum OrderError {
    /// The mini-application data is not a JSON object
    InvalidFormat(String),
    /// The requested plan is not in the catalogue
    UnknownTariff(Option<String>),
    /// Building or sending the invoice failed
    Dispatch(String),
}

impl OrderError {
    /// Localization key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            OrderError::InvalidFormat(_) => "error-invalid-format",
            OrderError::UnknownTariff(_) => "error-tariff-not-found",
            OrderError::Dispatch(_) => "error-order-failed",
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::InvalidFormat(_) => "invalid_format",
            OrderError::UnknownTariff(_) => "unknown_tariff",
            OrderError::Dispatch(_) => "dispatch_failed",
        }
    }
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::InvalidFormat(msg) => write!(f, "[INVALID_FORMAT] {}", msg),
            OrderError::UnknownTariff(Some(plan)) => write!(f, "[UNKNOWN_TARIFF] '{}'", plan),
            OrderError::UnknownTariff(None) => write!(f, "[UNKNOWN_TARIFF] no plan given"),
            OrderError::Dispatch(msg) => write!(f, "[DISPATCH] {}", msg),
        }
    }
}

impl std::error::Error for OrderError {}

/// Decode the mini-application data blob
pub fn parse_order_request(data: &str) -> Result<OrderRequest, OrderError> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| OrderError::InvalidFormat(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| OrderError::InvalidFormat("expected a JSON object".to_string()))?;

    Ok(OrderRequest {
        plan: object
            .get("plan")
            .and_then(Value::as_str)
            .map(str::to_string),
        user_id: object.get("user_id").cloned().unwrap_or(Value::Null),
    })
}

/// Settings the invoice builder needs besides the catalogue
#[derive(Debug, Clone, Copy)]
pub struct InvoiceSettings<'a> {
    pub provider_token: &'a str,
    pub start_parameter: &'a str,
}

/// Validate an order against the catalogue and build its invoice.
///
/// `title` renders the localized invoice title for a plan name.
pub fn build_invoice(
    catalogue: &TariffCatalogue,
    order: &OrderRequest,
    settings: InvoiceSettings<'_>,
    title: impl FnOnce(&str) -> String,
) -> Result<InvoiceRequest, OrderError> {
    let plan = order
        .plan
        .as_deref()
        .ok_or(OrderError::UnknownTariff(None))?;
    let tariff = catalogue
        .get(plan)
        .ok_or_else(|| OrderError::UnknownTariff(Some(plan.to_string())))?;

    Ok(InvoiceRequest {
        title: title(&tariff.name),
        description: tariff.description.clone(),
        payload: InvoicePayload {
            plan: tariff.name.clone(),
            months: tariff.months,
            user_id: order.user_id.clone(),
        },
        provider_token: settings.provider_token.to_string(),
        currency: catalogue.currency().to_string(),
        prices: vec![PriceLine {
            label: tariff.name.clone(),
            amount: catalogue.amount_in_subunits(tariff),
        }],
        start_parameter: settings.start_parameter.to_string(),
    })
}

/// Render a client-supplied JSON scalar the way a user expects to read it
pub fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
