use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use super::repo_types::SpiritType;
use crate::error::ApiError;
use crate::extract::{check_len, check_max_len, check_opt_range, double_option, Validate};

const MAX_PRICE: i64 = 100_000_000; // NUMERIC(10, 2)

/// Bounds apply to the value as stored, i.e. after rounding to cents.
fn check_price(field: &str, value: Option<Decimal>) -> Result<(), ApiError> {
    match value.map(|p| p.round_dp(2)) {
        Some(p) if p < Decimal::ZERO || p >= Decimal::from(MAX_PRICE) => Err(
            ApiError::Validation(format!("{field} must be between 0 and {MAX_PRICE}")),
        ),
        _ => Ok(()),
    }
}

fn check_proof(value: Option<f64>) -> Result<(), ApiError> {
    if let Some(p) = value {
        if !p.is_finite() {
            return Err(ApiError::validation("proof must be a number"));
        }
    }
    check_opt_range("proof", value, 0.0, 200.0)
}

#[derive(Debug, Deserialize)]
pub struct BottleCreate {
    pub name: String,
    pub spirit_type: SpiritType,
    pub distillery: Option<String>,
    pub proof: Option<f64>,
    pub age_statement: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub release_year: Option<i32>,
    pub batch_number: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_paid: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_current: Option<Decimal>,
    pub acquisition_date: Option<Date>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub image_url: Option<String>,
    /// Ask for best-effort AI research after the bottle is stored.
    #[serde(default)]
    pub research: bool,
}

impl Validate for BottleCreate {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("name", self.name.trim(), 1, 255)?;
        check_max_len("distillery", self.distillery.as_deref(), 255)?;
        check_proof(self.proof)?;
        check_max_len("age_statement", self.age_statement.as_deref(), 50)?;
        check_max_len("region", self.region.as_deref(), 100)?;
        check_max_len("country", self.country.as_deref(), 100)?;
        check_opt_range("release_year", self.release_year, 1800, 2100)?;
        check_max_len("batch_number", self.batch_number.as_deref(), 100)?;
        check_price("price_paid", self.price_paid)?;
        check_price("price_current", self.price_current)?;
        check_opt_range("rating", self.rating, 1, 5)?;
        check_max_len("image_url", self.image_url.as_deref(), 500)
    }
}

/// Merge-patch body: absent keys are untouched, `null` clears nullable columns.
#[derive(Debug, Default, Deserialize)]
pub struct BottleUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub spirit_type: Option<Option<SpiritType>>,
    #[serde(default, deserialize_with = "double_option")]
    pub distillery: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub proof: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub age_statement: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub release_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub batch_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option_price")]
    pub price_paid: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option_price")]
    pub price_current: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub acquisition_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

fn double_option_price<'de, D>(de: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    rust_decimal::serde::float_option::deserialize(de).map(Some)
}

impl Validate for BottleUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        fn inner<T: Copy>(v: &Option<Option<T>>) -> Option<T> {
            v.and_then(|x| x)
        }

        match &self.name {
            Some(None) => return Err(ApiError::validation("name cannot be null")),
            Some(Some(n)) => check_len("name", n.trim(), 1, 255)?,
            None => {}
        }
        if matches!(self.spirit_type, Some(None)) {
            return Err(ApiError::validation("spirit_type cannot be null"));
        }
        check_max_len("distillery", self.distillery.clone().flatten().as_deref(), 255)?;
        check_proof(inner(&self.proof))?;
        check_max_len(
            "age_statement",
            self.age_statement.clone().flatten().as_deref(),
            50,
        )?;
        check_max_len("region", self.region.clone().flatten().as_deref(), 100)?;
        check_max_len("country", self.country.clone().flatten().as_deref(), 100)?;
        check_opt_range("release_year", inner(&self.release_year), 1800, 2100)?;
        check_max_len(
            "batch_number",
            self.batch_number.clone().flatten().as_deref(),
            100,
        )?;
        check_price("price_paid", inner(&self.price_paid))?;
        check_price("price_current", inner(&self.price_current))?;
        check_opt_range("rating", inner(&self.rating), 1, 5)?;
        check_max_len("image_url", self.image_url.clone().flatten().as_deref(), 500)
    }
}

/// Query for `GET /bottles`.
#[derive(Debug, Default, Deserialize)]
pub struct OwnerListQuery {
    pub spirit_type: Option<SpiritType>,
    pub min_rating: Option<i32>,
}

impl Validate for OwnerListQuery {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_range("min_rating", self.min_rating, 1, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(v: serde_json::Value) -> BottleCreate {
        serde_json::from_value(v).expect("valid json")
    }

    #[test]
    fn create_accepts_minimal_body() {
        let b = create(json!({ "name": "Buffalo Trace", "spirit_type": "whiskey" }));
        assert!(b.validate().is_ok());
        assert!(!b.research);
        assert!(b.price_paid.is_none());
    }

    #[test]
    fn create_parses_prices_and_dates() {
        let b = create(json!({
            "name": "Blanton's",
            "spirit_type": "whiskey",
            "price_paid": 64.99,
            "acquisition_date": "2024-03-09",
            "research": true
        }));
        assert_eq!(b.price_paid, Some(Decimal::new(6499, 2)));
        assert_eq!(
            b.acquisition_date,
            Some(Date::from_calendar_date(2024, time::Month::March, 9).unwrap())
        );
        assert!(b.research);
    }

    #[test]
    fn create_rejects_out_of_range_values() {
        let base = json!({ "name": "X", "spirit_type": "rum" });
        for (k, v) in [
            ("rating", json!(6)),
            ("rating", json!(0)),
            ("proof", json!(250.0)),
            ("release_year", json!(1700)),
            ("price_paid", json!(-1.0)),
        ] {
            let mut body = base.clone();
            body[k] = v;
            assert!(create(body).validate().is_err(), "{k} should be rejected");
        }
        assert!(create(json!({ "name": "   ", "spirit_type": "rum" }))
            .validate()
            .is_err());
    }

    #[test]
    fn price_bound_applies_after_rounding() {
        // 99999999.999 would be stored as 100000000.00
        assert!(check_price("price_paid", Some(Decimal::new(99_999_999_999, 3))).is_err());
        assert!(check_price("price_paid", Some(Decimal::new(99_999_999_994, 3))).is_ok());
        assert!(check_price("price_paid", Some(Decimal::new(-1, 2))).is_err());
    }

    #[test]
    fn update_tracks_explicit_nulls() {
        let u: BottleUpdate =
            serde_json::from_value(json!({ "distillery": null, "rating": 4, "price_paid": null }))
                .unwrap();
        assert_eq!(u.distillery, Some(None));
        assert_eq!(u.rating, Some(Some(4)));
        assert_eq!(u.price_paid, Some(None));
        assert!(u.name.is_none());
        assert!(u.validate().is_ok());
    }

    #[test]
    fn update_rejects_null_for_required_columns() {
        let u: BottleUpdate = serde_json::from_value(json!({ "name": null })).unwrap();
        assert!(u.validate().is_err());
        let u: BottleUpdate = serde_json::from_value(json!({ "spirit_type": null })).unwrap();
        assert!(u.validate().is_err());
    }

    #[test]
    fn update_price_is_parsed_from_float() {
        let u: BottleUpdate = serde_json::from_value(json!({ "price_current": 120.5 })).unwrap();
        assert_eq!(u.price_current, Some(Some(Decimal::new(1205, 1))));
    }
}
