use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{check_len, double_option, Validate};

#[derive(Debug, Deserialize)]
pub struct CollectionCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl Validate for CollectionCreate {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("name", self.name.trim(), 1, 255)
    }
}

/// Merge-patch; `name` and `is_public` cannot be cleared.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_public: Option<Option<bool>>,
}

impl Validate for CollectionUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        match &self.name {
            Some(None) => return Err(ApiError::validation("name cannot be null")),
            Some(Some(n)) => check_len("name", n.trim(), 1, 255)?,
            None => {}
        }
        if matches!(self.is_public, Some(None)) {
            return Err(ApiError::validation("is_public cannot be null"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_defaults_to_private() {
        let c: CollectionCreate = serde_json::from_value(json!({ "name": "Peated" })).unwrap();
        assert!(!c.is_public);
        assert!(c.validate().is_ok());
        let blank: CollectionCreate = serde_json::from_value(json!({ "name": "  " })).unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn update_rejects_null_required_fields() {
        let u: CollectionUpdate = serde_json::from_value(json!({ "is_public": null })).unwrap();
        assert!(u.validate().is_err());
        let u: CollectionUpdate = serde_json::from_value(json!({ "name": null })).unwrap();
        assert!(u.validate().is_err());
        let u: CollectionUpdate =
            serde_json::from_value(json!({ "description": null, "is_public": true })).unwrap();
        assert!(u.validate().is_ok());
        assert_eq!(u.description, Some(None));
    }
}
