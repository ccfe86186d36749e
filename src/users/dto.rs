use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{check_max_len, double_option, Validate};

/// Profile merge-patch: absent keys are left alone, `null` clears.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        check_max_len(
            "display_name",
            self.display_name.as_ref().and_then(|v| v.as_deref()),
            100,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_long_display_name() {
        let u: UserUpdate =
            serde_json::from_value(serde_json::json!({ "display_name": "x".repeat(101) })).unwrap();
        assert!(u.validate().is_err());
    }

    #[test]
    fn null_bio_is_an_explicit_clear() {
        let u: UserUpdate = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        assert_eq!(u.bio, Some(None));
        assert!(u.display_name.is_none());
        assert!(u.validate().is_ok());
    }
}
