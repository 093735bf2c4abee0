//! Application entry point building the Actix-Web server.
use dotenvy::dotenv;

use keygate::{models::config::ServiceConfig, run};

#[actix_web::main]
async fn main() {
    // Load environment variables from `.env` in local development.
    dotenv().ok();
    // Initialize logger with default level INFO if not provided.
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // A broken configuration is fatal: nothing binds before this succeeds.
    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Error loading service config: {err}");
            std::process::exit(1);
        }
    };

    match run(config).await {
        Ok(_) => log::info!("Server stopped"),
        Err(err) => {
            log::error!("Error starting server: {err}");
            std::process::exit(1);
        }
    }
}
