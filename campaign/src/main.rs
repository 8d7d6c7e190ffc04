//! Campaign data command-line tool.
//!
//! Inspect, back up and restore the campaign store from a terminal:
//!
//! ```bash
//! cargo run -p campaign -- export backup.json
//! cargo run -p campaign -- --data-dir ./saves list characters
//! ```

use campaign_core::backup::{backup_path, list_backups, SavedSnapshot};
use campaign_core::{validate_state, CampaignStore, DataService, State, StoreConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// A parsed command line.
#[derive(Debug, Default)]
struct Args {
    data_dir: Option<PathBuf>,
    storage_key: Option<String>,
    pretty: bool,
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();

    // Check for --help
    if raw.is_empty() || raw.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let args = parse_args(&raw);
    let mut config = StoreConfig::from_env().with_pretty(args.pretty);
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(key) = args.storage_key {
        config = config.with_storage_key(key);
    }

    tracing::debug!(?config, command = %args.command.join(" "), "running command");

    let command: Vec<&str> = args.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["export"] => export(config, None),
        ["export", file] => export(config, Some(PathBuf::from(file))),
        ["import", file] => import(config, PathBuf::from(file)),
        ["validate"] => validate(config, None),
        ["validate", file] => validate(config, Some(PathBuf::from(file))),
        ["list", collection] => list(config, collection),
        ["clear"] => clear(config),
        ["backup"] => backup(config, None).await,
        ["backup", dir] => backup(config, Some(PathBuf::from(dir))).await,
        ["backups"] => backups(config, None).await,
        ["backups", dir] => backups(config, Some(PathBuf::from(dir))).await,
        _ => {
            eprintln!("Unrecognized command: {}", args.command.join(" "));
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    }
}

fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                if let Some(dir) = args.get(i + 1) {
                    parsed.data_dir = Some(PathBuf::from(dir));
                    i += 1;
                }
            }
            "--key" => {
                if let Some(key) = args.get(i + 1) {
                    parsed.storage_key = Some(key.clone());
                    i += 1;
                }
            }
            "--pretty" => parsed.pretty = true,
            other => parsed.command.push(other.to_string()),
        }
        i += 1;
    }

    parsed
}

fn export(config: StoreConfig, file: Option<PathBuf>) -> CliResult<()> {
    let store = DataService::inspect(config)?;
    let json = store.export_json()?;
    match file {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Exported {} entities to {}", store.export_state().entity_count(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn import(config: StoreConfig, file: PathBuf) -> CliResult<()> {
    let json = std::fs::read_to_string(&file)?;
    let mut store = DataService::open(config)?;
    store.import_json(&json)?;
    let entities = store.export_state().entity_count();
    store.close()?;
    println!("Imported {entities} entities from {}", file.display());
    Ok(())
}

fn validate(config: StoreConfig, file: Option<PathBuf>) -> CliResult<()> {
    let (label, mut state) = match file {
        Some(path) => {
            let state = State::from_json(&std::fs::read_to_string(&path)?)?;
            (path.display().to_string(), state)
        }
        None => {
            let store = DataService::inspect(config)?;
            (store.config().storage_key.clone(), store.export_state())
        }
    };
    state.migrate_legacy();
    state.ensure_collections();

    let errors = validate_state(&state);
    if errors.is_empty() {
        println!("{label}: valid ({} entities)", state.entity_count());
        return Ok(());
    }

    println!("{label}: {} problem(s)", errors.len());
    for error in &errors {
        println!("  {error}");
    }
    std::process::exit(1);
}

fn list(config: StoreConfig, collection: &str) -> CliResult<()> {
    let mut store = DataService::inspect(config)?;
    let entities = store.get_all(collection);
    if entities.is_empty() {
        println!("No entities in '{collection}'.");
        return Ok(());
    }

    for entity in &entities {
        let label = entity
            .get_str("name")
            .or_else(|| entity.get_str("title"))
            .unwrap_or("(unnamed)");
        println!("{}  {label}", entity.id().unwrap_or("-"));
    }
    Ok(())
}

fn clear(config: StoreConfig) -> CliResult<()> {
    let mut store = DataService::open(config)?;
    store.clear_data();
    store.close()?;
    println!("Cleared all collections.");
    Ok(())
}

async fn backup(config: StoreConfig, dir: Option<PathBuf>) -> CliResult<()> {
    let dir = dir.unwrap_or_else(|| config.backup_dir());
    let store = DataService::inspect(config)?;
    let name = store.config().storage_key.clone();

    let snapshot = SavedSnapshot::new(store.export_state(), &name);
    let path = backup_path(&dir, &name);
    snapshot.save_json(&path).await?;
    println!(
        "Backed up {} entities to {}",
        snapshot.metadata.total_entities,
        path.display()
    );
    Ok(())
}

async fn backups(config: StoreConfig, dir: Option<PathBuf>) -> CliResult<()> {
    let dir = dir.unwrap_or_else(|| config.backup_dir());
    let backups = list_backups(&dir).await?;
    if backups.is_empty() {
        println!("No backups in {}", dir.display());
        return Ok(());
    }

    for info in &backups {
        println!(
            "{}  {}  {} entities  {}",
            info.metadata.saved_at,
            info.metadata.campaign_name,
            info.metadata.total_entities,
            info.path.display()
        );
    }
    Ok(())
}

fn print_help() {
    println!("Campaign - campaign data store tool");
    println!();
    println!("USAGE:");
    println!("  campaign [OPTIONS] <COMMAND>");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help          Show this help message");
    println!("  --data-dir <DIR>    Data directory (default: $CAMPAIGN_DATA_DIR or ./campaign-data)");
    println!("  --key <KEY>         Storage key (default: $CAMPAIGN_STORAGE_KEY or campaignData)");
    println!("  --pretty            Persist indented JSON");
    println!();
    println!("COMMANDS:");
    println!("  export [FILE]       Print the full state, or write it to FILE");
    println!("  import FILE         Replace the state with FILE if it validates");
    println!("  validate [FILE]     Check FILE (or the stored state) for problems");
    println!("  list COLLECTION     List entities, e.g. characters or guildLogs.activities");
    println!("  clear               Reset every collection to empty");
    println!("  backup [DIR]        Write a timestamped snapshot (default: <data-dir>/backups)");
    println!("  backups [DIR]       List snapshots, newest first");
    println!();
    println!("  export, validate, list and backup never rewrite the stored data.");
    println!();
    println!("EXAMPLES:");
    println!("  campaign export > campaign.json");
    println!("  campaign import campaign.json");
    println!("  RUST_LOG=debug campaign list quests");
}
