//! Parts Registry - spare parts lookup and registration service
//!
//! Serves the shared-password web UI over a local SQLite store, with
//! uploaded images and the CSV master kept next to the database.

use clap::Parser;
use parts_registry::web::AppState;
use parts_registry::{database, web, SessionGate, StoragePaths};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared-password web app for spare part lookup, registration and export
#[derive(Parser, Debug)]
#[command(name = "parts_registry")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base directory for the database, uploaded images and the CSV master
    #[arg(short, long, default_value_t = default_data_dir())]
    data_dir: String,

    /// Port for the web interface
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

/// Returns the default data directory: ~/.local/share/parts_registry
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parts_registry")
        .to_string_lossy()
        .to_string()
}

const DEFAULT_PASSWORD: &str = "parts123";
const DEFAULT_SECRET: &str = "change-me-please";

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let data_dir = PathBuf::from(&args.data_dir);

    log::info!("Starting parts_registry...");
    log::info!("Data directory: {}", data_dir.display());

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        log::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    // Open database connection
    let db_path = data_dir.join("parts.db");
    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = database::init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    match database::part_count(&conn) {
        Ok(count) => log::info!("{} parts registered", count),
        Err(e) => log::warn!("Failed to count parts: {}", e),
    }

    // Both must be overridden in any real deployment
    let password = std::env::var("PARTS_PASSWORD").unwrap_or_else(|_| {
        log::warn!("PARTS_PASSWORD not set, using the default placeholder");
        DEFAULT_PASSWORD.to_string()
    });
    let secret = std::env::var("PARTS_SESSION_SECRET").unwrap_or_else(|_| {
        log::warn!("PARTS_SESSION_SECRET not set, using the default placeholder");
        DEFAULT_SECRET.to_string()
    });

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        gate: Arc::new(SessionGate::new(password, secret)),
        paths: Arc::new(StoragePaths {
            images_dir: data_dir.join("images"),
            export_path: data_dir.join("parts_master.csv"),
        }),
    };

    if let Err(e) = web::serve(state, args.port).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
