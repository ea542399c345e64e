use anyhow::{Context, Result};
use clap::Parser;
use roadmap_kg::db::Db;
use roadmap_kg::roadmap::seed_demo_data;
use roadmap_kg::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Replace all roadmaps, quizzes and progress with the demo data set")]
struct Args {
    /// Database file to seed (defaults to server.db_path from config.toml)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Migrations directory (defaults to server.migrations_dir from config.toml)
    #[arg(long)]
    migrations: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();

    // Config is only needed for whatever the flags leave out
    let (db_path, migrations_dir) = match (args.db, args.migrations) {
        (Some(db), Some(migrations)) => (db, migrations),
        (db, migrations) => {
            let config = Config::load()?;
            (
                db.unwrap_or_else(|| config.db_path().to_path_buf()),
                migrations.unwrap_or_else(|| config.migrations_dir().to_path_buf()),
            )
        }
    };

    let db = Db::new(&db_path);
    db.migrate(&migrations_dir)
        .await
        .context("Failed to run database migrations")?;

    let summary = seed_demo_data(&db).await?;
    println!(
        "Seeded {}: {} roadmaps, {} items, {} questions, snapshot with {} nodes / {} edges",
        db_path.display(),
        summary.roadmaps,
        summary.items,
        summary.questions,
        summary.nodes,
        summary.edges
    );

    Ok(())
}
