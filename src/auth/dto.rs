use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{check_len, check_max_len, Validate};
use crate::users::repo_types::User;

use super::services::is_valid_email;

/// Standard JWT claims used in the app.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

impl RegisterRequest {
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("username", self.username.trim(), 3, 50)?;
        if !is_valid_email(self.email.trim()) {
            return Err(ApiError::validation("Invalid email"));
        }
        if self.password.chars().count() < 8 {
            return Err(ApiError::validation(
                "password must be at least 8 characters",
            ));
        }
        check_max_len("display_name", self.display_name.as_deref(), 100)
    }
}

/// Form body for login (`application/x-www-form-urlencoded`).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

impl AuthResponse {
    pub fn bearer(access_token: String, user: User) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            user,
        }
    }
}
