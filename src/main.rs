use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use taskboard::config::Config;
use taskboard::drafting::OpenAiProvider;
use taskboard::routes;
use taskboard::state::AppState;
use taskboard::store::MongoStore;

fn cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(3600);

    if config.allows_any_origin() {
        cors.allow_any_origin()
    } else {
        config
            .cors_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
            .supports_credentials()
    }
}

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    error!("startup failed: {}", e);
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let store = Arc::new(
        MongoStore::connect(&config.mongodb_url, &config.database_name)
            .await
            .map_err(startup_error)?,
    );
    store.ensure_indexes().await.map_err(startup_error)?;

    let provider = OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        Duration::from_secs(config.openai_timeout_secs),
    )
    .map_err(startup_error)?;

    let state = web::Data::new(AppState::from_config(
        &config,
        store.clone(),
        store.clone(),
        Arc::new(provider),
    ));

    info!("Starting Taskboard server at {}", config.server_url());
    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&server_config))
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    store.close().await;
    info!("MongoDB connection closed");
    Ok(())
}
