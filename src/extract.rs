//! Request extractors that turn malformed or out-of-range input into a 422
//! before a handler runs.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Form, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use crate::error::ApiError;

pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

pub struct ValidForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Validate for Pagination {
    fn validate(&self) -> Result<(), ApiError> {
        if self.skip < 0 {
            return Err(ApiError::validation("skip must be >= 0"));
        }
        check_range("limit", self.limit, 1, 100)
    }
}

/// Deserializes a present key as `Some(value)`, so `null` becomes `Some(None)`
/// and an absent key (via `#[serde(default)]`) stays `None`.
pub fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

pub fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(ApiError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn check_max_len(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    match value {
        Some(v) => check_len(field, v, 0, max),
        None => Ok(()),
    }
}

pub fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), ApiError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ApiError::Validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}

pub fn check_opt_range<T>(field: &str, value: Option<T>, min: T, max: T) -> Result<(), ApiError>
where
    T: PartialOrd + std::fmt::Display,
{
    match value {
        Some(v) => check_range(field, v, min, max),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        bio: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.bio, None);
        let null: Patch = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        assert_eq!(null.bio, Some(None));
        let set: Patch = serde_json::from_str(r#"{"bio": "peat lover"}"#).unwrap();
        assert_eq!(set.bio, Some(Some("peat lover".into())));
    }

    #[test]
    fn pagination_bounds() {
        assert!(Pagination::default().validate().is_ok());
        assert!(Pagination { skip: -1, limit: 10 }.validate().is_err());
        assert!(Pagination { skip: 0, limit: 0 }.validate().is_err());
        assert!(Pagination { skip: 0, limit: 101 }.validate().is_err());
        assert!(Pagination { skip: 5, limit: 100 }.validate().is_ok());
    }

    #[test]
    fn length_checks_count_chars() {
        assert!(check_len("name", "", 1, 255).is_err());
        assert!(check_len("name", "Ardbeg", 1, 255).is_ok());
        assert!(check_len("name", "ééé", 1, 3).is_ok());
        assert!(check_max_len("region", None, 100).is_ok());
        assert!(check_max_len("region", Some(&"x".repeat(101)), 100).is_err());
    }

    #[test]
    fn range_checks() {
        assert!(check_range("rating", 0, 1, 5).is_err());
        assert!(check_range("rating", 5, 1, 5).is_ok());
        assert!(check_opt_range("proof", Some(200.5), 0.0, 200.0).is_err());
        assert!(check_opt_range::<i32>("year", None, 1800, 2100).is_ok());
    }
}
