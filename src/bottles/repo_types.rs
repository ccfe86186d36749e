use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpiritType {
    Whiskey,
    Vodka,
    Tequila,
    Rum,
    Gin,
    Beer,
    Wine,
    Liqueur,
    Other,
}

impl SpiritType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpiritType::Whiskey => "whiskey",
            SpiritType::Vodka => "vodka",
            SpiritType::Tequila => "tequila",
            SpiritType::Rum => "rum",
            SpiritType::Gin => "gin",
            SpiritType::Beer => "beer",
            SpiritType::Wine => "wine",
            SpiritType::Liqueur => "liqueur",
            SpiritType::Other => "other",
        }
    }
}

impl fmt::Display for SpiritType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bottle row. `deleted_at` is set on soft delete and never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Bottle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub spirit_type: SpiritType,
    pub distillery: Option<String>,
    pub proof: Option<f64>,
    pub age_statement: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub release_year: Option<i32>,
    pub batch_number: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_paid: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_current: Option<Decimal>,
    pub acquisition_date: Option<Date>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub image_url: Option<String>,
    pub ai_details: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
}

/// Compact projection used by recommendation and similarity lists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BottleSummary {
    pub id: Uuid,
    pub name: String,
    pub spirit_type: SpiritType,
    pub distillery: Option<String>,
    pub rating: Option<i32>,
}
