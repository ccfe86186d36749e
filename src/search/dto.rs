use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bottles::repo_types::{Bottle, SpiritType};
use crate::error::ApiError;
use crate::extract::{check_len, check_opt_range, Validate};

/// Criteria for the filter endpoints. Absent criteria impose no constraint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterCriteria {
    pub spirit_type: Option<String>,
    pub min_proof: Option<f64>,
    pub max_proof: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl Validate for FilterCriteria {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_range("min_proof", self.min_proof, 0.0, 200.0)?;
        check_opt_range("max_proof", self.max_proof, 0.0, 200.0)?;
        for (field, price) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if price.map(|p| p < 0.0).unwrap_or(false) {
                return Err(ApiError::Validation(format!("{field} must be >= 0")));
            }
        }
        check_opt_range("min_rating", self.min_rating, 1, 5)?;
        check_opt_range("max_rating", self.max_rating, 1, 5)?;
        check_opt_range("year_from", self.year_from, 1800, 2100)?;
        check_opt_range("year_to", self.year_to, 1800, 2100)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

impl Validate for SearchQuery {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("q", self.q.trim(), 1, 100)
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default)
    }
}

impl Validate for LimitQuery {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_range("limit", self.limit, 1, 50)
    }
}

#[derive(Debug, Serialize)]
pub struct FilterPage {
    pub total: i64,
    pub count: usize,
    pub skip: i64,
    pub limit: i64,
    pub bottles: Vec<Bottle>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SpiritCount {
    pub spirit_type: SpiritType,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub total_bottles: i64,
    pub spirit_breakdown: Vec<SpiritCount>,
    pub average_price: Option<f64>,
    pub most_common_spirit: Option<SpiritType>,
}

#[derive(Debug, Serialize)]
pub struct OwnerStats {
    pub total_bottles: i64,
    pub average_rating: Option<f64>,
    pub spirit_breakdown: Vec<SpiritCount>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct PriceStats {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub average_price: Option<f64>,
    pub median_price: Option<f64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PopularBottle {
    pub id: Uuid,
    pub name: String,
    pub spirit_type: SpiritType,
    pub distillery: Option<String>,
    pub personal_rating: Option<i32>,
    pub community_rating: Option<f64>,
    pub total_reviews: i64,
}

#[derive(Debug, Serialize)]
pub struct DistilleryProfile {
    pub distillery: String,
    pub total_bottles: i64,
    pub countries: Vec<String>,
    pub regions: Vec<String>,
    pub spirit_types: Vec<String>,
    pub average_rating: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_from_query_string() {
        let c: FilterCriteria =
            parse_criteria("min_rating=4&max_rating=5&region=islay&min_price=20.5");
        assert_eq!(c.min_rating, Some(4));
        assert_eq!(c.max_rating, Some(5));
        assert_eq!(c.region.as_deref(), Some("islay"));
        assert_eq!(c.min_price, Some(20.5));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn criteria_rejects_out_of_range() {
        let c = FilterCriteria {
            max_rating: Some(6),
            ..Default::default()
        };
        assert!(c.validate().is_err());
        let c = FilterCriteria {
            min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(c.validate().is_err());
        let c = FilterCriteria {
            year_to: Some(2200),
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn search_query_length() {
        assert!(SearchQuery { q: String::new() }.validate().is_err());
        assert!(SearchQuery { q: "x".repeat(101) }.validate().is_err());
        assert!(SearchQuery { q: "   ".into() }.validate().is_err());
        assert!(SearchQuery { q: "islay".into() }.validate().is_ok());
    }

    fn parse_criteria(qs: &str) -> FilterCriteria {
        let uri: axum::http::Uri = format!("/search/filter?{qs}").parse().unwrap();
        let axum::extract::Query(c) = axum::extract::Query::<FilterCriteria>::try_from_uri(&uri)
            .expect("query parses");
        c
    }
}
