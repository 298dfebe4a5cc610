use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};

use code_roast::auth::TokenIssuer;
use code_roast::config::Config;
use code_roast::media::CloudinaryUploader;
use code_roast::{db, AppState, Repositories};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let pool = db::connect(&config).await.map_err(|e| {
        log::error!("database startup failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let state = AppState::new(
        TokenIssuer::new(&config.jwt_secret),
        Repositories::postgres(pool),
        Arc::new(CloudinaryUploader::new(config.cloudinary.clone())),
    );

    log::info!("Starting code_roast server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::new("%a \"%r\" %s %b \"%{User-Agent}i\" %Dms"))
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
