use crate::{
    auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, TOKEN_COOKIE},
    error::AppError,
    state::AppState,
};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Lifetime of the login cookie, independent of the token ttl.
const COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Register a new user
///
/// Creates a new account and returns its public profile. No token is issued;
/// the client logs in separately.
///
/// ## Responses:
/// - `201 Created`: `{"message": ..., "user": {...}}`
/// - `400 Bad Request`: a field is missing, or the username or email is taken.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = state
        .auth
        .register(
            &register_data.username,
            &register_data.email,
            &register_data.password,
        )
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully.".into(),
        user,
    }))
}

/// Login user
///
/// Authenticates by email and password. The token is returned in the body
/// and also set as an HttpOnly `token` cookie.
///
/// ## Responses:
/// - `200 OK`: `{"message": ..., "token": ..., "user": {...}}`
/// - `400 Bad Request`: email or password missing.
/// - `401 Unauthorized`: unknown email or wrong password (same message for both).
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let outcome = state
        .auth
        .login(&login_data.email, &login_data.password)
        .await?;

    let cookie = Cookie::build(TOKEN_COOKIE, outcome.token.clone())
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(COOKIE_MAX_AGE_DAYS))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        message: "Login successfully.".into(),
        token: outcome.token,
        user: outcome.user,
    }))
}
