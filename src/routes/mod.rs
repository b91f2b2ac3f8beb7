pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

pub use health::not_found;

/// Malformed or mistyped JSON bodies become a 400 in the usual error envelope.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected JSON body: {}", err);
    AppError::BadRequest("Invalid JSON format".into()).into()
}

/// Registers every `/api` route. `guard` is wrapped around the routes that
/// need an authenticated user; registration, login and public profile
/// lookup stay open.
pub fn config(cfg: &mut web::ServiceConfig, guard: AuthMiddleware) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/api/auth")
                .service(auth::register)
                .service(auth::login),
        )
        .service(
            web::scope("/api/users")
                .service(
                    web::resource("/profile")
                        .wrap(guard.clone())
                        .route(web::get().to(users::get_profile)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(users::get_user))
                        .route(web::put().to(users::update_user).wrap(guard.clone())),
                ),
        )
        .service(
            web::scope("/api/tasks")
                .wrap(guard)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
