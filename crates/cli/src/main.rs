use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use theory_explorer_common::{logger, AppConfig, TheoryExplorerError};
use theory_explorer_embedding::create_provider;
use theory_explorer_vector::{load_seed_file, TheoryRecord, TheoryStore};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "theory-explorer")]
#[command(about = "Theory Explorer - embedding-backed theory search", long_about = None)]
struct Cli {
    /// Store file (overrides EMBED_FILE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed the seed theories if the store has not been built yet
    Seed {
        /// Seed file (overrides SEED_FILE)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Rank stored theories against a query
    Search {
        query: String,

        /// Number of results (defaults to DEFAULT_TOP_K)
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },

    /// Embed one theory record from a JSON file and insert or replace it
    Upsert {
        #[arg(long)]
        file: PathBuf,

        /// Write the store to disk afterwards
        #[arg(long)]
        save: bool,
    },

    /// Print the stored record for an id
    Get { id: String },

    /// Print store statistics
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    load_dotenv_from_project_root();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<TheoryExplorerError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logger::setup_logging(&config)?;
    tracing::info!("Theory Explorer starting - store: {}", config.store_path.display());

    let provider = create_provider(&config)?;
    let store = TheoryStore::from_config(&config, provider);
    store.load().await?;

    match cli.command {
        Commands::Seed { file } => {
            let seed_path = file.unwrap_or_else(|| config.seed_path.clone());
            let records = load_seed_file(&seed_path).await?;
            if store.build_from_seed(&records).await? {
                println!("Seeded {} theories into {}", store.len().await, store.path().display());
            } else {
                println!("Store already built ({} theories), nothing to do", store.len().await);
            }
        }
        Commands::Search { query, top_k } => {
            let k = top_k.unwrap_or(config.default_top_k);
            for result in store.search(&query, k).await? {
                let line = json!({
                    "id": result.id,
                    "score": result.score,
                    "name": result.meta.get("name"),
                });
                println!("{}", line);
            }
        }
        Commands::Upsert { file, save } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let record: TheoryRecord = serde_json::from_str(&raw)
                .map_err(|e| TheoryExplorerError::invalid_input(format!("{}: {}", file.display(), e)))?;

            let item = store.upsert_theory(&record).await?;
            if save {
                store.save().await?;
            }
            println!(
                "Upserted '{}' (dimension {}){}",
                item.id,
                item.vector.len(),
                if save { ", saved" } else { "" }
            );
        }
        Commands::Get { id } => match store.get(&id).await {
            Some(item) => println!("{}", serde_json::to_string_pretty(&item.meta)?),
            None => {
                return Err(TheoryExplorerError::invalid_input(format!("No theory with id '{}'", id)).into())
            }
        },
        Commands::Stats => {
            println!("{}", serde_json::to_string_pretty(&store.stats().await)?);
        }
    }

    Ok(())
}
