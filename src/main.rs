use env_logger::Env;
use log::{error, info};
use std::process;

use knowmyslots::{Config, Database, app};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let db = match Database::open(&config.database_url) {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {e}");
            process::exit(1);
        }
    };
    info!("Database ready");

    if let Err(e) = app::run(config, db).await {
        error!("Server error: {e}");
        process::exit(1);
    }
}
