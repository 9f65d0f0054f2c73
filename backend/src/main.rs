use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use std::env;
use std::sync::Arc;

use predictor::config::{AppConfig, ImageConfig, TabularConfig};
use predictor::imaging::model::{self as image_model, ImagePredictor, ModelMeta};
use predictor::imaging::routes::{self as image_routes, ImageState};
use predictor::prediction_log::CsvPredictionLog;
use predictor::tabular::model as tabular_model;
use predictor::tabular::routes::{self as tabular_routes, TabularState};

fn startup_error<E: std::fmt::Display>(e: E) -> std::io::Error {
    log::error!("Startup failed: {}", e);
    std::io::Error::other(e.to_string())
}

fn tabular_server(config: &TabularConfig) -> std::io::Result<Server> {
    let model = tabular_model::load(&config.model_path).map_err(startup_error)?;
    log::info!("Loaded survival model from {}", config.model_path.display());

    let state = web::Data::new(TabularState::new(Arc::from(model)));
    log::info!("Survival form listening on http://{}", config.bind);

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(tabular_routes::configure_routes)
    })
    .bind(&config.bind)?
    .run())
}

fn image_server(config: &ImageConfig) -> std::io::Result<Server> {
    let meta = ModelMeta::from_file(&config.meta_path).map_err(startup_error)?;
    let model = image_model::load(&config.model_path, &meta).map_err(startup_error)?;
    log::info!(
        "Loaded X-ray model from {} (classes {:?}, input {}px)",
        config.model_path.display(),
        meta.class_names,
        meta.input_size
    );

    let state = web::Data::new(ImageState {
        predictor: ImagePredictor::new(model, meta),
        log: Arc::new(CsvPredictionLog::new(config.log_path.clone())),
        max_upload_bytes: config.max_upload_bytes,
    });
    log::info!(
        "X-ray predictor listening on http://{} (log: {})",
        config.bind,
        config.log_path.display()
    );

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(image_routes::configure_routes)
    })
    .bind(&config.bind)?
    .run())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = AppConfig::load().map_err(startup_error)?;

    let mut servers = Vec::new();
    if config.tabular.enabled {
        servers.push(tabular_server(&config.tabular)?);
    }
    if config.image.enabled {
        servers.push(image_server(&config.image)?);
    }
    if servers.is_empty() {
        log::warn!("Both apps are disabled in the config, nothing to serve");
        return Ok(());
    }

    futures::future::try_join_all(servers).await?;
    Ok(())
}
