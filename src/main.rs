use anyhow::{Context, Result};
use roadmap_kg::api::ApiServer;
use roadmap_kg::db::{migrate, Db};
use roadmap_kg::error::RoadmapError;
use roadmap_kg::Config;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" => run_server().await?,
        "verify" => run_schema_verification().await?,
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: roadmap-kg [serve|verify]");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Load config and open a migrated database
async fn open_database() -> Result<(Config, Db)> {
    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());

    let db = Db::new(config.db_path());
    db.migrate(config.migrations_dir())
        .await
        .context("Failed to run database migrations")?;
    log::info!("Database initialized successfully");

    Ok((config, db))
}

/// Run the HTTP API
async fn run_server() -> Result<()> {
    log::info!("Starting roadmap-kg v{}", env!("CARGO_PKG_VERSION"));

    let (config, db) = open_database().await?;
    let server = ApiServer::new(db, &config)?;
    server.run().await?;

    Ok(())
}

/// Check that every expected table exists and the pragmas are in effect
async fn run_schema_verification() -> Result<()> {
    let (_config, db) = open_database().await?;

    db.with_connection(|conn| {
        let tables = migrate::list_tables(conn)?;
        let missing: Vec<&str> = migrate::EXPECTED_TABLES
            .iter()
            .copied()
            .filter(|t| !tables.iter().any(|have| have == t))
            .collect();
        if !missing.is_empty() {
            return Err(RoadmapError::Config(format!("Missing tables: {}", missing.join(", "))));
        }
        log::debug!("✓ {} tables present", migrate::EXPECTED_TABLES.len());

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(RoadmapError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(RoadmapError::Config(format!("Database integrity check failed: {}", integrity)));
        }

        let applied = migrate::get_applied_migrations(conn)?;
        log::info!("✓ {} migrations applied", applied.len());
        Ok(())
    })
    .await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}
