//! ideacap command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ideacap_capture::{CaptureOrchestrator, JsonFileIdeaStore, RawImage, SyncCoordinator};
use ideacap_core::{
    to_anki_qa, to_anki_tsv, to_daily_note_entry, to_markdown, to_obsidian_note, AppConfig,
    Idea, IdeaEdit, IdeaSort, IdeaStore, RemoteStore,
};
use ideacap_inference::CompletionClient;
use ideacap_sync::RemoteSyncEngine;

#[derive(Parser)]
#[command(name = "ideacap", version, about = "Capture handwritten ideas, tag them and sync them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize, tag and save an idea from an image file
    Capture {
        image: PathBuf,
        /// Title to use instead of one derived from the text
        #[arg(long)]
        title: Option<String>,
    },
    /// List saved ideas, newest first
    List,
    /// Upload unsynced ideas
    Sync {
        /// Re-upload every idea regardless of state
        #[arg(long)]
        force: bool,
    },
    /// Import ideas from the remote store
    Pull,
    /// Edit an idea
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Delete an idea locally and remotely
    Delete { id: Uuid },
    /// Print ideas in a shareable format
    Export {
        /// Idea to export; Anki formats export every idea when omitted
        id: Option<Uuid>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Obsidian: directory for the note and its image. Anki: output file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Markdown,
    Obsidian,
    Daily,
    /// Tab-separated Anki import file
    Anki,
    /// Question/answer cards
    AnkiQa,
}

fn init_tracing() {
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter (default: "ideacap=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ideacap=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so command output stays pipeable.
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
    }
}

async fn fetch_idea(store: &dyn IdeaStore, id: Uuid) -> anyhow::Result<Idea> {
    store
        .fetch(id)
        .await?
        .with_context(|| format!("No idea with id {}", id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let store: Arc<dyn IdeaStore> = Arc::new(JsonFileIdeaStore::open(&config.data_dir).await?);
    let remote: Arc<dyn RemoteStore> =
        Arc::new(RemoteSyncEngine::from_config(config.remote.clone())?);
    let coordinator = SyncCoordinator::new(Arc::clone(&store), Arc::clone(&remote));

    match cli.command {
        Command::Capture { image, title } => {
            config.validate()?;
            let completion = Arc::new(CompletionClient::from_config(config.completion.clone())?);
            let orchestrator = CaptureOrchestrator::new(completion, remote, store);

            let raw = RawImage::open(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            let snapshot = orchestrator.process_image(&raw).await?;
            println!("{}", snapshot.recognized_text);
            if !snapshot.tags.is_empty() {
                println!("tags: {}", snapshot.tags.join(", "));
            }

            let (idea, upload) = orchestrator.save(title.as_deref()).await?;
            println!("saved {} \"{}\"", idea.id(), idea.title());
            // Give the background upload a chance to finish before exiting.
            upload.await.ok();
        }
        Command::List => {
            for idea in store.list(IdeaSort::CreatedDesc).await? {
                println!(
                    "{}  {:<8}  {}  {}  [{}]",
                    idea.id(),
                    idea.sync_state().to_string(),
                    idea.created_at().format("%Y-%m-%d %H:%M"),
                    idea.title(),
                    idea.tags_text()
                );
            }
        }
        Command::Sync { force } => {
            let summary = coordinator.sync_all(force).await?;
            println!(
                "synced {}/{} ideas ({} failed)",
                summary.succeeded, summary.attempted, summary.failed
            );
            if summary.failed > 0 {
                bail!("{} ideas failed to sync", summary.failed);
            }
        }
        Command::Pull => {
            let summary = coordinator.pull_remote().await?;
            println!(
                "imported {}, updated {}, unchanged {}, skipped {}",
                summary.imported, summary.updated, summary.unchanged, summary.skipped
            );
        }
        Command::Edit {
            id,
            title,
            content,
            tags,
        } => {
            let edit = IdeaEdit {
                title,
                content,
                tags: tags.map(|t| {
                    t.into_iter()
                        .map(|tag| tag.trim().to_string())
                        .filter(|tag| !tag.is_empty())
                        .collect()
                }),
            };
            if edit.is_empty() {
                bail!("Nothing to edit: pass --title, --content or --tags");
            }
            let idea = coordinator.edit(id, edit).await?;
            println!("updated {} \"{}\"", idea.id(), idea.title());
        }
        Command::Delete { id } => {
            if coordinator.delete(id).await? {
                println!("deleted {}", id);
            } else {
                bail!("No idea with id {}", id);
            }
        }
        Command::Export { id, format, out } => match format {
            ExportFormat::Anki | ExportFormat::AnkiQa => {
                let ideas = match id {
                    Some(id) => vec![fetch_idea(store.as_ref(), id).await?],
                    None => store.list(IdeaSort::CreatedAsc).await?,
                };
                let text = if matches!(format, ExportFormat::Anki) {
                    to_anki_tsv(&ideas)
                } else {
                    to_anki_qa(&ideas, chrono::Utc::now())
                };
                match out {
                    Some(file) => {
                        std::fs::write(&file, text)?;
                        println!("{}", file.display());
                    }
                    None => println!("{}", text),
                }
            }
            ExportFormat::Markdown | ExportFormat::Daily | ExportFormat::Obsidian => {
                let id = id.context("An idea id is required for this format")?;
                let idea = fetch_idea(store.as_ref(), id).await?;

                match format {
                    ExportFormat::Markdown => println!("{}", to_markdown(&idea)),
                    ExportFormat::Daily => println!("{}", to_daily_note_entry(&idea)),
                    _ => {
                        let note = to_obsidian_note(&idea);
                        match out {
                            Some(dir) => {
                                std::fs::create_dir_all(&dir)?;
                                let path = dir.join(&note.filename);
                                std::fs::write(&path, note.body)?;
                                if let Some(image) = idea.image_data() {
                                    let attachments = dir.join("attachments");
                                    std::fs::create_dir_all(&attachments)?;
                                    std::fs::write(
                                        attachments.join(format!("{}.jpg", idea.id())),
                                        image,
                                    )?;
                                }
                                println!("{}", path.display());
                            }
                            None => println!("{}", note.body),
                        }
                    }
                }
            }
        },
    }

    Ok(())
}
