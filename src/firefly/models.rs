//! Wire shapes of the Firefly III JSON:API responses.
//!
//! Only the fields the reports read are modelled. Firefly sends amounts as
//! decimal strings and ids as strings, but older instances and proxies emit
//! plain numbers, so both are accepted.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct Document<D> {
    pub data: D,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct Resource<A> {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub attributes: A,
}

#[derive(Debug, Deserialize)]
pub struct BudgetAttributes {
    pub name: String,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BudgetLimitAttributes {
    #[serde(deserialize_with = "de_id")]
    pub budget_id: String,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryAttributes {
    pub name: String,
    #[serde(default)]
    pub spent: Vec<CategorySum>,
    #[serde(default)]
    pub earned: Vec<CategorySum>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySum {
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub sum: Option<f64>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// A transaction group; reports only look at its first split.
#[derive(Debug, Deserialize)]
pub struct TransactionGroupAttributes {
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub transactions: Vec<TransactionSplit>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionSplit {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub date: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub destination_name: Option<String>,
    #[serde(default)]
    pub budget_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountAttributes {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub current_balance: Option<f64>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid amount: {:?}", s))),
        }
    }
}

fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn de_opt_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(raw) => raw.into_f64().map(Some),
        None => Ok(None),
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        String(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::String(s) => s,
    })
}
