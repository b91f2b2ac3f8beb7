use std::sync::Arc;

use crate::auth::{AuthMiddleware, AuthService, CredentialAuthService, PasswordHasher, TokenCodec};
use crate::config::Config;
use crate::store::{CredentialStore, TaskStore};

/// Process-wide handles shared by every worker, constructed once at startup
/// and registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub credentials: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: Arc<TokenCodec>,
    pub hasher: PasswordHasher,
    /// Whether the login cookie carries the `Secure` attribute.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        let tokens = Arc::new(TokenCodec::new(config.jwt_secret.as_bytes(), config.jwt_ttl()));
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let auth = Arc::new(CredentialAuthService::new(
            Arc::clone(&credentials),
            hasher,
            Arc::clone(&tokens),
        ));

        Self {
            auth,
            credentials,
            tasks,
            tokens,
            hasher,
            secure_cookies: config.is_production(),
        }
    }

    /// Middleware guarding routes that need an authenticated user.
    pub fn auth_middleware(&self) -> AuthMiddleware {
        AuthMiddleware::new(Arc::clone(&self.tokens), Arc::clone(&self.credentials))
    }
}
