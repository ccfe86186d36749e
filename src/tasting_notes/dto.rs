use serde::Deserialize;
use time::Date;

use crate::error::ApiError;
use crate::extract::{check_opt_range, double_option, Validate};

#[derive(Debug, Default, Deserialize)]
pub struct TastingNoteCreate {
    pub nose: Option<String>,
    pub palate: Option<String>,
    pub finish: Option<String>,
    pub overall_notes: Option<String>,
    pub rating: Option<i32>,
    pub tasted_date: Option<Date>,
}

impl Validate for TastingNoteCreate {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_range("rating", self.rating, 1, 5)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TastingNoteUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub nose: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub palate: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub finish: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub overall_notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tasted_date: Option<Option<Date>>,
}

impl Validate for TastingNoteUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_range("rating", self.rating.flatten(), 1, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_bounds() {
        let n: TastingNoteCreate = serde_json::from_value(json!({ "rating": 6 })).unwrap();
        assert!(n.validate().is_err());
        let n: TastingNoteCreate =
            serde_json::from_value(json!({ "nose": "honey", "rating": 5, "tasted_date": "2024-11-02" }))
                .unwrap();
        assert!(n.validate().is_ok());
    }

    #[test]
    fn update_can_clear_rating() {
        let u: TastingNoteUpdate = serde_json::from_value(json!({ "rating": null })).unwrap();
        assert_eq!(u.rating, Some(None));
        assert!(u.validate().is_ok());
        let u: TastingNoteUpdate = serde_json::from_value(json!({ "rating": 0 })).unwrap();
        assert!(u.validate().is_err());
    }
}
