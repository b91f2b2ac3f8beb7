use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::auth::password::validate_password_bytes;

/// A registered account as stored in the `users` table.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// server. Use [`UserResponse`] for anything sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create an [`Identity`]; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Sanitized view of an [`Identity`] returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[validate(
        length(min = 1, message = "password must not be empty"),
        custom = "validate_password_bytes"
    )]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        let now = Utc::now();
        Identity {
            id: 7,
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_response_omits_password_hash() {
        let json = serde_json::to_value(UserResponse::from(&identity())).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "alice");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_update_user_request_validation() {
        let ok = UpdateUserRequest {
            email: Some("new@x.com".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_email = UpdateUserRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let empty_username = UpdateUserRequest {
            username: Some(String::new()),
            ..Default::default()
        };
        assert!(empty_username.validate().is_err());

        assert!(UpdateUserRequest::default().validate().is_ok());
    }

    #[test]
    fn test_update_password_limit_counts_bytes() {
        let too_long = UpdateUserRequest {
            password: Some("é".repeat(40)),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());

        let at_limit = UpdateUserRequest {
            password: Some("é".repeat(36)),
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }
}
