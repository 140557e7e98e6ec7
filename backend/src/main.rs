mod config;
mod explain;
mod model;
mod routes;
mod storage;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use config::ModelConfig;
use model::{Classifier, ModelHandle};
use routes::configure_routes;
use std::env;
use storage::cloudinary::CloudinaryService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let model_config = ModelConfig::load().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Model config loading failed: {e}"),
        )
    })?;

    let handle = match Classifier::load(&model_config) {
        Ok(classifier) => {
            log::info!("Loaded classifier from {}", model_config.model.path);
            ModelHandle::new(Some(classifier))
        }
        Err(e) => {
            // the process keeps serving; inference endpoints answer 503
            // until the next deploy ships a loadable artifact
            log::error!("Failed to load model at startup: {e}");
            ModelHandle::new(None)
        }
    };
    let model = web::Data::new(handle);

    let cloudinary_url = env::var("CLOUDINARY_URL").map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::Other, "CLOUDINARY_URL is not set")
    })?;
    let storage = CloudinaryService::from_url(&cloudinary_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let storage = web::Data::new(storage);

    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
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
            .app_data(model.clone())
            .app_data(storage.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
