//! Registration and login orchestration.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::password::PasswordHasher;
use super::token::TokenCodec;
use crate::models::{NewIdentity, UserResponse};
use crate::store::{CredentialStore, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("email or username already registered")]
    AlreadyExists,

    /// Same message for an unknown email and a wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Internal(error.to_string())
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserResponse,
}

#[async_trait]
pub trait AuthService: Send + Sync + 'static {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, AuthError>;

    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError>;
}

/// [`AuthService`] backed by a [`CredentialStore`], bcrypt and JWT.
pub struct CredentialAuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenCodec>,
}

impl CredentialAuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenCodec>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }
}

#[async_trait]
impl AuthService for CredentialAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, AuthError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "username, email, and password are required".into(),
            ));
        }

        match self.store.find_by_username_or_email(username, email).await {
            Ok(_) => return Err(AuthError::AlreadyExists),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;

        let identity = self
            .store
            .insert(NewIdentity {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                StoreError::UniquenessViolation => AuthError::AlreadyExists,
                other => other.into(),
            })?;

        log::info!("Registered user {} ({})", identity.id, identity.username);
        Ok(UserResponse::from(&identity))
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "email and password are required".into(),
            ));
        }

        // An unknown email returns before any bcrypt work, so it answers
        // faster than a wrong password.
        let identity = match self.store.find_by_email(email).await {
            Ok(identity) => identity,
            Err(StoreError::NotFound) => {
                log::warn!("Login failed: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let matches = self
            .hasher
            .verify_blocking(password.to_string(), identity.password_hash.clone())
            .await?;
        if !matches {
            log::warn!("Login failed: wrong password for user {}", identity.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(identity.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        log::info!("User {} logged in", identity.id);
        Ok(LoginOutcome {
            token,
            user: UserResponse::from(&identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn service() -> (CredentialAuthService, Arc<TokenCodec>, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let tokens = Arc::new(TokenCodec::new(b"service-test-secret", Duration::hours(1)));
        let service =
            CredentialAuthService::new(store.clone(), PasswordHasher::new(4), tokens.clone());
        (service, tokens, store)
    }

    #[actix_rt::test]
    async fn test_register_then_login() {
        let (service, tokens, _) = service();

        let user = service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");

        let outcome = service.login("alice@x.com", "secret1").await.unwrap();
        assert_eq!(outcome.user, user);
        assert_eq!(tokens.verify(&outcome.token).unwrap(), user.id);
    }

    #[actix_rt::test]
    async fn test_password_is_stored_hashed() {
        let (service, _, store) = service();
        let user = service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();

        let stored = store.find_by_id(user.id).await.unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.password_hash.starts_with("$2"));
    }

    #[actix_rt::test]
    async fn test_register_requires_all_fields() {
        let (service, _, _) = service();
        for (username, email, password) in [
            ("", "a@x.com", "pw"),
            ("a", "", "pw"),
            ("a", "a@x.com", ""),
        ] {
            assert!(matches!(
                service.register(username, email, password).await,
                Err(AuthError::Validation(_))
            ));
        }
    }

    #[actix_rt::test]
    async fn test_register_rejects_duplicates() {
        let (service, _, _) = service();
        service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();

        assert!(matches!(
            service.register("alice", "other@x.com", "pw").await,
            Err(AuthError::AlreadyExists)
        ));
        assert!(matches!(
            service.register("other", "alice@x.com", "pw").await,
            Err(AuthError::AlreadyExists)
        ));
    }

    #[actix_rt::test]
    async fn test_concurrent_registration_has_one_winner() {
        let (service, _, _) = service();
        let (first, second) = futures::join!(
            service.register("alice", "same@x.com", "pw1"),
            service.register("alice2", "same@x.com", "pw2"),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::AlreadyExists))));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _, _) = service();
        service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();

        let wrong_password = service.login("alice@x.com", "nope").await.unwrap_err();
        let unknown_email = service.login("bob@x.com", "secret1").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[actix_rt::test]
    async fn test_login_requires_fields() {
        let (service, _, _) = service();
        assert!(matches!(
            service.login("", "pw").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.login("a@x.com", "").await,
            Err(AuthError::Validation(_))
        ));
    }
}
