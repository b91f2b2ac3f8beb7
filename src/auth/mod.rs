pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserResponse;
use password::validate_password_bytes;

// Re-export necessary items
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use service::{AuthError, AuthService, CredentialAuthService, LoginOutcome};
pub use token::{parse_ttl, Claims, TokenCodec, TokenError};

/// Name of the cookie that carries the token as an alternative to the
/// `Authorization` header.
pub const TOKEN_COOKIE: &str = "token";

pub const MISSING_TOKEN_MESSAGE: &str = "Access denied. Token not found.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token.";
pub const UNKNOWN_SUBJECT_MESSAGE: &str = "User not found.";

/// Represents the payload for a user login request.
///
/// Missing fields deserialize as empty strings so that the service reports
/// them with its own validation message.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(max = 255))]
    pub email: String,
    #[validate(custom = "validate_password_bytes")]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(max = 50))]
    pub username: String,
    #[validate(length(max = 255))]
    pub email: String,
    #[validate(custom = "validate_password_bytes")]
    pub password: String,
}

/// Body of a successful registration (HTTP 201).
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Body of a successful login (HTTP 200).
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_become_empty() {
        let req: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "email": "a@x.com" })).unwrap();
        assert_eq!(req.username, "");
        assert_eq!(req.password, "");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_overlong_password_is_rejected() {
        let req = LoginRequest {
            email: "a@x.com".into(),
            password: "p".repeat(73),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_password_limit_counts_bytes() {
        let req = RegisterRequest {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "é".repeat(40),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            password: "é".repeat(36),
            ..req
        };
        assert!(req.validate().is_ok());
    }
}
