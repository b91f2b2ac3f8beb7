use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use std::ops::Deref;

use crate::error::AppError;
use crate::models::Identity;

/// The identity resolved by `AuthMiddleware` for the current request.
///
/// Handlers take this as an argument instead of reading request extensions
/// themselves. It only exists on routes wrapped by the middleware; anywhere
/// else extraction fails with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl Deref for CurrentUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthorized(super::MISSING_TOKEN_MESSAGE.to_string());
                ready(Err(err.into()))
            }
        }
    }
}
