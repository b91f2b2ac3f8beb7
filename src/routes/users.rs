use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{UpdateUserRequest, UserResponse},
    response::success,
    state::AppState,
    store::StoreError,
};
use actix_web::{http::StatusCode, web, Responder};
use serde_json::json;
use validator::Validate;

fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("Invalid user ID".into()))
}

/// Fails with `AlreadyExists` when `found` belongs to someone other than `self_id`.
fn ensure_unclaimed(
    found: Result<crate::models::Identity, StoreError>,
    self_id: i64,
    message: &str,
) -> Result<(), AppError> {
    match found {
        Ok(other) if other.id != self_id => Err(AppError::AlreadyExists(message.into())),
        Ok(_) | Err(StoreError::NotFound) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// `GET /api/users/profile`: the authenticated user's own profile.
pub async fn get_profile(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(success(
        StatusCode::OK,
        "Profile retrieved successfully",
        json!({ "user": UserResponse::from(&*user) }),
    ))
}

/// `GET /api/users/{id}`: public lookup of a profile by id.
///
/// ## Responses:
/// - `200 OK`: envelope with `{"user": {...}}`.
/// - `400 Bad Request`: the id is not a positive integer.
/// - `404 Not Found`: no such user.
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let identity = state
        .credentials
        .find_by_id(user_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("user not found".into()),
            other => other.into(),
        })?;

    Ok(success(
        StatusCode::OK,
        "User retrieved successfully",
        json!({ "user": UserResponse::from(&identity) }),
    ))
}

/// `PUT /api/users/{id}`: updates the authenticated user's own profile.
///
/// ## Request Body:
/// Any of `username`, `email`, `password`. A new password is re-hashed.
///
/// ## Responses:
/// - `200 OK`: envelope with the updated `{"user": {...}}`.
/// - `400 Bad Request`: invalid id or field, or the username or email is taken.
/// - `403 Forbidden`: the id is not the caller's.
pub async fn update_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    user_id: web::Path<String>,
    update_data: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = parse_user_id(&user_id)?;
    if user_id != user.id {
        return Err(AppError::Forbidden("unauthorized to update this user".into()));
    }
    update_data.validate()?;
    let update = update_data.into_inner();

    let mut identity = user.0;

    if let Some(email) = update.email.filter(|e| *e != identity.email) {
        let found = state.credentials.find_by_email(&email).await;
        ensure_unclaimed(found, identity.id, "email already in use")?;
        identity.email = email;
    }

    if let Some(username) = update.username.filter(|u| *u != identity.username) {
        let found = state.credentials.find_by_username(&username).await;
        ensure_unclaimed(found, identity.id, "username already in use")?;
        identity.username = username;
    }

    if let Some(password) = update.password {
        identity.password_hash = state.hasher.hash_blocking(password).await?;
    }

    let identity = state.credentials.update(&identity).await?;
    log::info!("User {} updated their profile", identity.id);

    Ok(success(
        StatusCode::OK,
        "Profile updated successfully",
        json!({ "user": UserResponse::from(&identity) }),
    ))
}
