use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use taskdesk::{
    routes,
    store::{PgCredentialStore, PgTaskStore},
    AppState, Config,
};

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io_error("Invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| io_error("Failed to connect to database", e))?;
    log::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io_error("Failed to run migrations", e))?;

    let state = AppState::new(
        &config,
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgTaskStore::new(pool)),
    );
    let guard = state.auth_middleware();
    let cors_origin = config.cors_origin.clone();

    log::info!(
        "Starting Taskdesk server at {} ({})",
        config.server_url(),
        config.app_env
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);
        let guard = guard.clone();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .service(routes::health::index)
            .service(routes::health::health)
            .configure(move |cfg| routes::config(cfg, guard))
            .default_service(web::to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
