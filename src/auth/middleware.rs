use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

use super::extractors::CurrentUser;
use super::token::TokenCodec;
use super::{INVALID_TOKEN_MESSAGE, MISSING_TOKEN_MESSAGE, TOKEN_COOKIE, UNKNOWN_SUBJECT_MESSAGE};
use crate::error::AppError;
use crate::models::Identity;
use crate::store::{CredentialStore, StoreError};

/// Rejects requests without a valid token and attaches the resolved
/// [`CurrentUser`] to the ones it lets through.
///
/// Wrap only the scopes and resources that need authentication.
#[derive(Clone)]
pub struct AuthMiddleware {
    tokens: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: Arc::clone(&self.tokens),
            store: Arc::clone(&self.store),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let tokens = Arc::clone(&self.tokens);
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let token = extract_token(&req)
                .ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN_MESSAGE.into()))?;
            let identity = resolve_identity(&token, &tokens, store.as_ref()).await?;

            req.extensions_mut().insert(CurrentUser(identity));
            service.call(req).await
        })
    }
}

/// Token from `Authorization: Bearer <token>`, falling back to the `token`
/// cookie. The header wins when both are present.
pub fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match from_header {
        Some(token) => Some(token.to_string()),
        None => req
            .cookie(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    }
}

/// Verifies `token` and loads its subject. Every token failure maps to the
/// same 401; a subject that no longer exists is also a 401.
async fn resolve_identity(
    token: &str,
    tokens: &TokenCodec,
    store: &dyn CredentialStore,
) -> Result<Identity, AppError> {
    let subject_id = tokens.verify(token).map_err(|e| {
        log::debug!("Rejected token: {}", e);
        AppError::Unauthorized(INVALID_TOKEN_MESSAGE.into())
    })?;

    store.find_by_id(subject_id).await.map_err(|e| match e {
        StoreError::NotFound => {
            log::debug!("Token subject {} no longer exists", subject_id);
            AppError::Unauthorized(UNKNOWN_SUBJECT_MESSAGE.into())
        }
        other => other.into(),
    })
}
