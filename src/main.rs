mod api;
mod blockchain;
mod config;
mod consensus;
mod error;
mod transaction;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;
use uuid::Uuid;

use api::AppState;
use config::Config;
use consensus::HttpPeerFetcher;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    let node_id = Uuid::new_v4().simple().to_string();
    let fetcher = HttpPeerFetcher::new(config.peer_timeout)
        .map_err(std::io::Error::other)?;

    let (host, port) = (config.host.clone(), config.port);
    info!(
        "node {node_id} starting at http://{host}:{port} (difficulty={})",
        config.difficulty
    );

    let state = web::Data::new(AppState::new(config, node_id, Box::new(fetcher)));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
