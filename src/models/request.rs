use alloy::hex;
use alloy::primitives::{Address, U256};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::GatewayError;

/// Upper bound on blocks inspected by one aggregation
pub const MAX_BLOCKS: u32 = 50;

/// Blocks inspected when the request carries no count
pub const DEFAULT_COUNT: u32 = 10;

/// Read-path request: `{ count?, address? }`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregationRequest {
    #[serde(
        default,
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl AggregationRequest {
    pub fn new(count: Option<i64>, address: Option<String>) -> Self {
        Self { count, address }
    }

    /// Requested block count clamped to `[1, MAX_BLOCKS]`
    pub fn effective_count(&self, default_count: u32) -> u32 {
        match self.count {
            Some(count) => count.clamp(1, MAX_BLOCKS as i64) as u32,
            None => default_count.clamp(1, MAX_BLOCKS),
        }
    }

    /// Trimmed, lowercased filter; a blank address means no filter
    pub fn address_filter(&self) -> Option<AddressFilter> {
        self.address.as_deref().and_then(AddressFilter::new)
    }
}

/// Accepts an integral JSON number or numeric text of any magnitude and
/// saturates it to `i64`; `effective_count` clamps from there. Null and empty
/// text mean "no count".
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CountVisitor)
}

struct CountVisitor;

impl<'de> Visitor<'de> for CountVisitor {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer block count")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(Some(saturate(v)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    // integers past u64 arrive from serde_json as floats
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.is_finite() && v.fract() == 0.0 {
            Ok(Some(v as i64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if let Ok(count) = trimmed.parse::<i128>() {
            return Ok(Some(saturate(count)));
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Some(if negative { i64::MIN } else { i64::MAX }))
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(CountVisitor)
    }
}

fn saturate(count: i128) -> i64 {
    i64::try_from(count).unwrap_or(if count < 0 { i64::MIN } else { i64::MAX })
}

/// Case-insensitive match on a transaction's sender or recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFilter(String);

impl AddressFilter {
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, address: &Address) -> bool {
        hex::encode_prefixed(address.as_slice()) == self.0
    }

    /// `to` is absent for contract creation and never matches
    pub fn matches_either(&self, from: &Address, to: Option<&Address>) -> bool {
        self.matches(from) || to.is_some_and(|to| self.matches(to))
    }
}

/// Write-path request: `{ to, amountEth }`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, rename = "amountEth")]
    pub amount_eth: Option<String>,
}

impl TransferRequest {
    pub fn new(to: impl Into<String>, amount_eth: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            amount_eth: Some(amount_eth.into()),
        }
    }

    /// Both fields must be present and non-empty
    pub fn required_fields(&self) -> Result<(&str, &str), GatewayError> {
        match (self.to.as_deref(), self.amount_eth.as_deref()) {
            (Some(to), Some(amount)) if !to.is_empty() && !amount.is_empty() => Ok((to, amount)),
            _ => Err(GatewayError::input("to & amountEth are required")),
        }
    }
}

/// A transfer that passed address and amount checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub to: Address,
    pub value_wei: U256,
}

/// Accepts a bare request object or a gateway event wrapping it in `body`,
/// where `body` may itself be a JSON-encoded string.
pub fn unwrap_event_body(event: Value) -> Result<Value, GatewayError> {
    let event = match event {
        Value::String(raw) => parse_json_text(&raw)?,
        other => other,
    };

    match event {
        Value::Object(mut map) if map.contains_key("body") => match map.remove("body") {
            Some(Value::String(raw)) => parse_json_text(&raw),
            Some(Value::Null) | None => Ok(Value::Object(Default::default())),
            Some(body) => Ok(body),
        },
        Value::Null => Ok(Value::Object(Default::default())),
        other => Ok(other),
    }
}

fn parse_json_text(raw: &str) -> Result<Value, GatewayError> {
    serde_json::from_str(raw).map_err(|e| GatewayError::input(format!("malformed request body: {}", e)))
}
