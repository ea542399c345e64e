use anyhow::Result;
use clap::Parser;
use roadmap_kg::ai::{GeminiClient, GenerativeModel};
use roadmap_kg::db::Db;
use roadmap_kg::{generate_knowledge_graph, Config};

#[derive(Parser, Debug)]
#[command(name = "graph")]
#[command(about = "Print the knowledge graph as JSON")]
struct Args {
    /// Skip relationship inference (contains edges only)
    #[arg(long)]
    no_ai: bool,

    /// Compact single-line output
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "warn")).init();

    let args = Args::parse();
    let config = Config::load()?;

    let db = Db::new(config.db_path());
    db.migrate(config.migrations_dir()).await?;

    let client = match config.ai_api_key() {
        Some(key) if !args.no_ai => Some(GeminiClient::from_config(&config.ai, key)?),
        Some(_) => None,
        None => {
            if !args.no_ai {
                log::warn!("{} not set; printing contains edges only", config.ai.api_key_env);
            }
            None
        }
    };

    let model = client.as_ref().map(|c| c as &dyn GenerativeModel);
    let graph = generate_knowledge_graph(&db, model).await?;

    let json = if args.compact {
        serde_json::to_string(&graph)?
    } else {
        serde_json::to_string_pretty(&graph)?
    };
    println!("{}", json);

    Ok(())
}
