//! gatekeeper CLI: operator interface to the publish-queue gatekeeper.

use clap::{Parser, Subcommand};
use publish_gatekeeper::config::{Config, PublishingSettings};
use publish_gatekeeper::db::Db;
use publish_gatekeeper::engine::{SaveOutcome, SavedItemDispatch};
use publish_gatekeeper::host::{HostFlags, PublishContext};
use publish_gatekeeper::model::{ItemId, ItemRecord, SaveEvent};
use publish_gatekeeper::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gatekeeper", about = "Publish-queue gatekeeper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a saved-item event (JSON) through the configured save handler
    Handle {
        /// Path to a JSON-encoded save event
        event: PathBuf,
        /// TOML file with a [publishing] table; overrides the environment
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Publish queue operations
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Template index operations
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List queued entries, newest first
    List {
        /// Maximum entries to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// Add or replace an item in the template index
    Register {
        /// Content database the item lives in
        #[arg(long, default_value = "master")]
        database: String,
        #[arg(long)]
        id: ItemId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent: Option<ItemId>,
        /// Template the item is based on
        #[arg(long)]
        template: Option<ItemId>,
        /// Mark the item as a clone
        #[arg(long)]
        clone: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "publish-gatekeeper".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;

    match cli.command {
        Command::Handle { event, settings } => {
            let settings = match settings {
                Some(path) => PublishingSettings::load(&path)?,
                None => config.publishing.clone(),
            };
            cmd_handle(db, &settings, event).await
        }
        Command::Queue {
            action: QueueAction::List { limit },
        } => cmd_queue_list(&db, limit).await,
        Command::Item {
            action:
                ItemAction::Register {
                    database,
                    id,
                    name,
                    parent,
                    template,
                    clone,
                },
        } => {
            db.register_item(&ItemRecord {
                database: database.clone(),
                id,
                name,
                parent_id: parent,
                template_id: template,
                is_clone: clone,
            })
            .await?;
            println!("Registered: {id} in {database}");
            Ok(())
        }
    }
}

async fn cmd_handle(db: Db, settings: &PublishingSettings, path: PathBuf) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&path)?;
    let event: SaveEvent = serde_json::from_str(&json)?;

    let db = Arc::new(db);
    let ctx = PublishContext::new(db.clone(), db, Arc::new(HostFlags::new()));
    let dispatch = SavedItemDispatch::initialize(settings, ctx);

    match dispatch.dispatch(&event).await? {
        SaveOutcome::Skipped(reason) => {
            println!("Skipped: {}", reason.as_str());
        }
        SaveOutcome::Queued(report) => {
            println!(
                "Queued: {} entr{} sent, {} new",
                report.entries.len(),
                if report.entries.len() == 1 { "y" } else { "ies" },
                report.created
            );
            for entry in &report.entries {
                println!(
                    "  {}  {:<10}  {:<8}  {}",
                    entry.item_id,
                    entry.language.to_string(),
                    entry.action.to_string(),
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }

    Ok(())
}

async fn cmd_queue_list(db: &Db, limit: i64) -> anyhow::Result<()> {
    let rows = db.list_queue(limit).await?;

    if rows.is_empty() {
        println!("Publish queue is empty.");
        return Ok(());
    }

    println!(
        "{:<6}  {:<10}  {:<38}  {:<10}  {:<8}  DATE",
        "ID", "DATABASE", "ITEM", "LANGUAGE", "ACTION"
    );
    println!("{}", "-".repeat(100));

    for row in &rows {
        let entry = &row.entry;
        println!(
            "{:<6}  {:<10}  {:<38}  {:<10}  {:<8}  {}",
            row.id,
            entry.database,
            entry.item_id.to_string(),
            entry.language.to_string(),
            entry.action.to_string(),
            entry.timestamp.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} entr{}", rows.len(), if rows.len() == 1 { "y" } else { "ies" });
    Ok(())
}
