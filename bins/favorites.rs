use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use configs::{AppConfig, StorageBackend};
use dotenvy::dotenv;
use models::ids::OwnerId;
use service::campsites::CampsiteCatalog;
use service::favorites::repository::{memory::InMemoryFavoritesRepository, FavoritesRepository};
use service::favorites::{AddOutcome, ClearOutcome, FavoritesService, RemoveOutcome};
use service::file::favorites_store::FileFavoritesRepository;
use tracing::{error, info};
use uuid::Uuid;

type Service = FavoritesService<dyn FavoritesRepository, CampsiteCatalog>;

#[derive(Parser, Debug)]
#[command(name = "favorites", version, about = "Manage per-user campsite favorites")]
struct Cli {
    /// Owner whose favorites are read or changed (not needed for `owners`)
    #[arg(long, short, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List favorites with campsites resolved
    List,
    /// Add several campsite ids at once
    Add {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Add a single campsite id
    AddOne { id: String },
    /// Remove a single campsite id
    Remove { id: String },
    /// Delete all favorites of the owner
    Clear,
    /// List owners that have a favorites set
    Owners,
}

fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            // logging is not up yet
            common::utils::logging::init_logging_default();
            error!(event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(&cfg.logging.format);

    let run_id = Uuid::new_v4();
    info!(event = "start", %run_id, version = env!("CARGO_PKG_VERSION"), backend = ?cfg.storage.backend, "favorites cli starting");

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cfg, cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(event = "run_failed", %run_id, error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn build_service(cfg: &AppConfig) -> anyhow::Result<Service> {
    let repo: Arc<dyn FavoritesRepository> = match cfg.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryFavoritesRepository::default()),
        StorageBackend::File => {
            let path = cfg.storage.file_path();
            common::env::ensure_data_dir(&path).await?;
            FileFavoritesRepository::new(path).await?
        }
    };
    let catalog = match cfg.catalog.path.as_deref() {
        Some(path) => CampsiteCatalog::from_json_file(Path::new(path)).await?,
        None => CampsiteCatalog::default(),
    };
    Ok(FavoritesService::new(repo, Arc::new(catalog)))
}

async fn run(cfg: AppConfig, cli: Cli) -> anyhow::Result<()> {
    let svc = build_service(&cfg).await?;
    let owner = || -> anyhow::Result<OwnerId> {
        let raw = cli.owner.as_deref().ok_or_else(|| anyhow::anyhow!("--owner is required for this command"))?;
        Ok(OwnerId::parse(raw)?)
    };

    match &cli.command {
        Command::List => match svc.get_favorites(&owner()?).await? {
            Some(view) => print_json(&view)?,
            None => println!("You do not have any favorites."),
        },
        Command::Add { ids } => print_json(&svc.add_many(&owner()?, ids).await?)?,
        Command::AddOne { id } => match svc.add_one(&owner()?, id).await? {
            AddOutcome::AlreadyPresent(_) => println!("That campsite is already in the list of favorites!"),
            outcome => print_json(outcome.set())?,
        },
        Command::Remove { id } => match svc.remove_one(&owner()?, id).await? {
            RemoveOutcome::Removed(set) => print_json(&set)?,
            RemoveOutcome::NotPresent(_) => println!("Campsite not found in your favorites."),
            RemoveOutcome::NoSetExists => println!("You do not have any favorites to delete."),
        },
        Command::Clear => match svc.remove_all(&owner()?).await? {
            ClearOutcome::Deleted(set) => print_json(&set)?,
            ClearOutcome::NoSetExists => println!("You do not have any favorites to delete."),
        },
        Command::Owners => {
            let mut owners = svc.owners().await?;
            owners.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            print_json(&owners)?
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
