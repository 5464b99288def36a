//! Renewal fee payments recorded in the patent register.
//!
//! The register history service answers in JSON with the payment entries under `items.pay`,
//! either as a list or as a single object when there is only one entry.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::ABSENT;
use crate::registry::parse_registry_date;

/// Latest renewal fee payment recorded for a patent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastPayment {
    /// Last payment year covered by the payment.
    pub year: Option<u32>,
    pub paid_on: Option<NaiveDate>,
    /// Amount in won.
    pub amount: Option<u32>,
}

impl LastPayment {
    #[must_use]
    pub fn year_label(&self) -> String {
        self.year.map_or_else(|| ABSENT.to_string(), |year| format!("{year}년차"))
    }

    #[must_use]
    pub fn paid_on_label(&self) -> String {
        crate::date_or_absent(self.paid_on)
    }

    #[must_use]
    pub fn amount_label(&self) -> String {
        self.amount.map_or_else(|| ABSENT.to_string(), crate::format_won)
    }

    /// Whether the given payment year is covered by this payment.
    ///
    /// `None` when the register did not report a payment year.
    #[must_use]
    pub fn covers(&self, year: u32) -> Option<bool> {
        self.year.map(|paid| year <= paid)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterHistoryResponse {
    #[serde(default)]
    result_code: Option<Value>,
    #[serde(default)]
    result_msg: Option<String>,
    #[serde(default)]
    items: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayItem {
    #[serde(default)]
    last_annl: Option<Value>,
    #[serde(default)]
    pay_date: Option<Value>,
    #[serde(default)]
    pay_amount: Option<Value>,
}

/// Parse a register history JSON response into the latest payment.
///
/// Returns `None` when the register has no payment entries.
///
/// # Errors
/// Returns an error if the body is not JSON or the response reports a failed call.
pub fn parse_register_history(json: &str) -> Result<Option<LastPayment>> {
    let json = json.trim_start_matches('\u{feff}').trim();
    let response: RegisterHistoryResponse = serde_json::from_str(json)
        .with_context(|| format!("Payment history response is not JSON: {}", crate::truncate_text(json, 80)))?;

    if let Some(code) = response.result_code.as_ref().and_then(value_text)
        && !code.chars().all(|c| c == '0')
    {
        let message = response.result_msg.as_deref().unwrap_or("unknown error").trim();
        bail!("Register history API error {code}: {message}");
    }

    let Some(pay) = response.items.as_ref().and_then(|items| items.get("pay")) else {
        return Ok(None);
    };
    let last = match pay {
        Value::Array(entries) => entries.last(),
        Value::Object(_) => Some(pay),
        _ => None,
    };
    let Some(last) = last else {
        return Ok(None);
    };

    let item = PayItem::deserialize(last).context("Invalid payment entry in register history")?;
    Ok(Some(LastPayment {
        year: item.last_annl.as_ref().and_then(value_digits).and_then(|d| d.parse().ok()),
        paid_on: item
            .pay_date
            .as_ref()
            .and_then(value_digits)
            .and_then(|d| parse_registry_date(&d)),
        amount: item.pay_amount.as_ref().and_then(value_digits).and_then(|d| d.parse().ok()),
    }))
}

/// Text of a string or number value, `None` for empty or placeholder text.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty() && text != ABSENT).then_some(text)
}

/// Only the ASCII digits of a value, so `3년차`, `2024.03.07` and `42,000` all parse.
fn value_digits(value: &Value) -> Option<String> {
    let digits: String = value_text(value)?.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}
