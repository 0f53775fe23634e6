use crate::{config::Config, db::MockStore, storage::JsonFileStorage};
use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use dotenv::dotenv;
use std::io::Error;

extern crate dotenv;

mod config;
mod db;
mod error;
mod models;
mod routes;
mod storage;
mod upload;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let Config {
        host,
        port,
        db_file,
    } = Config::load();

    //Loads the existing document, a broken one stops startup rather than being overwritten
    let storage = JsonFileStorage::new(db_file);
    log::info!("using store file {}", storage.path().display());
    let store = match MockStore::open(Box::new(storage)) {
        Ok(store) => store,
        Err(err) => {
            log::error!("Error loading the store: {}", err);
            return Err(Error::other("store could not be loaded."));
        }
    };
    let store = web::Data::new(store);

    log::info!("starting HTTP server at http://{host}:{port}");
    for endpoint in routes::ENDPOINTS {
        log::info!("  {endpoint}");
    }
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            // the browser client runs on its own dev-server origin
            .wrap(Cors::permissive())
            .app_data(store.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
