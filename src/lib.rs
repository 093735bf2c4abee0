use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderMap};
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};

pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::models::config::ServiceConfig;
use crate::services::tokens::TokenService;

/// Returns `None` when the `Authorization` header is absent or not a
/// bearer credential.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}

/// Build and run the HTTP server against a loaded, validated configuration.
pub async fn run(config: ServiceConfig) -> std::io::Result<()> {
    let bind_address = (config.server.host.clone(), config.server.port);
    let client_timeout = Duration::from_secs(config.server.timeout);
    log::info!(
        "Starting {} on {}:{}",
        config.server.name,
        bind_address.0,
        bind_address.1
    );

    let tokens = web::Data::new(TokenService::new(&config));
    let config = web::Data::new(config);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .app_data(config.clone())
            .app_data(tokens.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .service(routes::main::health)
            .service(routes::main::whoami)
            .service(
                web::scope("/token")
                    .wrap(middleware::TokenTransition)
                    .service(routes::main::refresh),
            )
    })
    .client_request_timeout(client_timeout)
    .bind(bind_address)?
    .run()
    .await
}
