use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use event_importer::config::Config;
use event_importer::draft::{EventDraft, EventSource, ImportRequest};
use event_importer::error::ImportError;
use event_importer::logging;
use event_importer::pipeline::ImportPipeline;
use event_importer::server;
use event_importer::storage::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "event_importer")]
#[command(about = "Event import pipeline for the events directory admin console")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview an event import from a source URL
    Import {
        /// Event page URL to scrape
        #[arg(long)]
        url: String,
    },
    /// Preview an event import from a pasted text file
    ImportText {
        /// File containing the pasted event details
        #[arg(long)]
        file: PathBuf,
        /// Source platform (manual, eventbrite, meetup, ticketspice, facebook, tixr, instagram)
        #[arg(long, default_value = "manual")]
        source: String,
    },
    /// Commit a previewed draft (JSON file) to storage
    Commit {
        /// File containing the approved draft JSON
        #[arg(long)]
        file: PathBuf,
    },
    /// Start the admin HTTP server
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

async fn create_storage() -> Result<Arc<dyn Storage>, Box<dyn std::error::Error>> {
    #[cfg(feature = "db")]
    {
        if std::env::var("LIBSQL_URL").is_ok() {
            let manager = event_importer::db::DatabaseManager::new().await?;
            manager.run_migrations().await?;
            return Ok(Arc::new(manager));
        }
    }
    Ok(Arc::new(InMemoryStorage::new()))
}

fn print_draft(draft: &EventDraft) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n📋 Preview:");
    println!("   Title:  {}", draft.title);
    println!("   Start:  {}", draft.start_time);
    println!("   Source: {}", draft.source.as_str());
    if let Some(venue) = &draft.venue {
        println!("   Venue:  {}", venue.name);
    }
    if let Some(warning) = &draft.warning {
        println!("\n⚠️  {warning}");
    }
    println!("\n{}", serde_json::to_string_pretty(draft)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let storage = create_storage().await?;
    let pipeline = Arc::new(ImportPipeline::new(storage, &config)?);

    match cli.command {
        Commands::Import { url } => {
            println!("🔎 Importing from {url}...");
            let draft = pipeline.preview(ImportRequest::Scrape { url }).await?;
            print_draft(&draft)?;
        }
        Commands::ImportText { file, source } => {
            let source = EventSource::parse(&source)
                .ok_or_else(|| format!("Unknown source platform: {source}"))?;
            let text = std::fs::read_to_string(&file)?;
            println!("🔎 Importing pasted text from {}...", file.display());
            let draft = pipeline.preview(ImportRequest::FreeText { text, source }).await?;
            print_draft(&draft)?;
        }
        Commands::Commit { file } => {
            let draft: EventDraft = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            println!("💾 Committing '{}'...", draft.title);
            match pipeline.commit(&draft).await {
                Ok(outcome) => {
                    println!("✅ Committed event with id {}", outcome.event.id);
                    if let Some(venue_id) = outcome.event.venue_id {
                        println!("   Venue id: {venue_id}");
                    }
                    if let Some(host_id) = outcome.event.host_id {
                        println!("   Host id:  {host_id}");
                    }
                    for warning in &outcome.warnings {
                        println!("⚠️  {warning}");
                    }
                }
                Err(ImportError::Duplicate { existing_id }) => {
                    println!("⚠️  Event already imported (existing id {existing_id})");
                }
                Err(e) => {
                    error!("Commit failed: {}", e);
                    println!("❌ Commit failed: {e}");
                }
            }
        }
        Commands::Serve { port } => {
            server::start_server(pipeline, port).await?;
        }
    }

    Ok(())
}
