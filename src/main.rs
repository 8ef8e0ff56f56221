//! distill - extractive summaries of procurement solicitations
//!
//! Reads solicitation text, keeps the passages most relevant to the title,
//! description and known aspects (scope of work, timeline, pricing, ...) and
//! writes one summary per document.

use anyhow::Context;
use clap::Parser;
use rfp_distill::{
    batch::run_batch,
    config::{AppConfig, EmbeddingBackend},
    document::{load_directory, load_manifest, Document},
    embedding::{EmbeddingProvider, FastEmbedProvider, HashingEmbedder},
    log_info, logging,
    summarizer::{AspectCatalog, AspectStore, SummaryContext},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Summarize a single text file
    Summarize {
        /// Document text
        #[arg(long)]
        input: PathBuf,
        /// Solicitation title
        #[arg(long)]
        title: String,
        /// Solicitation description
        #[arg(long)]
        description: Option<String>,
        /// Document id used for output file names (default: input file stem)
        #[arg(long)]
        id: Option<String>,
        /// Output directory (overrides config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Summarize every document of a manifest or directory tree
    Batch {
        /// JSON manifest: [{id, title, description?, text?, attachments?}]
        #[arg(long, conflicts_with = "root", required_unless_present = "root")]
        manifest: Option<PathBuf>,
        /// Directory with one subdirectory per document
        #[arg(long)]
        root: Option<PathBuf>,
        /// Output directory (overrides config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Aspect store operations
    Aspects {
        #[command(subcommand)]
        cmd: AspectsCmd,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(clap::Subcommand, Debug)]
enum AspectsCmd {
    /// Embed aspect examples and save the centroids
    Build {
        /// JSON catalog {aspect: [examples]} (default: built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output file (default: configured aspect store path)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the aspects of the configured store
    Show,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigCmd {
    /// Write the default configuration
    Init {
        /// Target file (default: config dir)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "distill")]
#[command(version)]
#[command(about = "Extractive summaries of procurement solicitations", long_about = None)]
struct Args {
    /// Configuration file path (overrides defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_logging(args.verbose || config.debug);

    match args.command {
        Command::Summarize {
            input,
            title,
            description,
            id,
            out_dir,
        } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {:?}", input))?;
            let id = id.unwrap_or_else(|| {
                input
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
            });
            let mut doc = Document::new(title, text).with_id(id);
            doc.description = description;
            run_documents(&config, vec![doc], out_dir).await
        }
        Command::Batch {
            manifest,
            root,
            out_dir,
        } => {
            let docs = match (manifest, root) {
                (Some(path), _) => load_manifest(&path)?,
                (None, Some(dir)) => load_directory(&dir)?,
                (None, None) => anyhow::bail!("either --manifest or --root is required"),
            };
            tracing::info!("Loaded {} documents", docs.len());
            run_documents(&config, docs, out_dir).await
        }
        Command::Aspects { cmd } => match cmd {
            AspectsCmd::Build { catalog, out } => {
                let catalog = match catalog {
                    Some(path) => AspectCatalog::from_file(&path)?,
                    None => AspectCatalog::builtin()?,
                };
                let provider = build_provider(&config).await?;
                let store =
                    AspectStore::build_within(provider.as_ref(), &catalog, config.embed_timeout()).await?;
                let out = out.unwrap_or_else(|| config.aspect_store_path());
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                store.save_to(&out)?;
                println!("Saved {} aspects ({}) to {}", store.len(), store.model, out.display());
                Ok(())
            }
            AspectsCmd::Show => {
                let path = config.aspect_store_path();
                let store = AspectStore::load_from(&path)?;
                println!("{} (model: {}, dimension: {})", path.display(), store.model, store.dimension);
                for name in store.names() {
                    println!("- {}", name);
                }
                Ok(())
            }
        },
        Command::Config { cmd } => match cmd {
            ConfigCmd::Init { path } => {
                let path = match path {
                    Some(p) => p,
                    None => {
                        let env =
                            std::env::var("DISTILL_ENV").unwrap_or_else(|_| "production".to_string());
                        AppConfig::config_dir()
                            .context("No config directory on this platform")?
                            .join(format!("config.{}.json", env))
                    }
                };
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                AppConfig::default().save_to_file(&path)?;
                println!("Wrote default configuration to {}", path.display());
                Ok(())
            }
        },
    }
}

/// Summarize `docs` one after another, writing files for non-empty outcomes.
async fn run_documents(config: &AppConfig, docs: Vec<Document>, out_dir: Option<PathBuf>) -> anyhow::Result<()> {
    if let Err(e) = logging::init_logger() {
        tracing::warn!("Run log disabled: {}", e);
    }

    let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
    let store_path = config.aspect_store_path();
    let provider = build_provider(config).await?;
    let store = load_aspects(&store_path, provider.as_ref(), config.embed_timeout()).await?;
    let ctx = SummaryContext::new(config.summarizer.clone(), store, provider)?
        .with_embed_timeout(config.embed_timeout());
    logging::log_run_header(config, &store_path);

    let report = run_batch(&ctx, &docs, &out_dir).await;

    log_info!(
        "done: {} summarized, {} empty, {} failed",
        report.written,
        report.empty,
        report.failed
    );
    println!(
        "{} summarized, {} empty, {} failed -> {} (log: {})",
        report.written,
        report.empty,
        report.failed,
        out_dir.display(),
        logging::get_log_path_display()
    );
    Ok(())
}

async fn build_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding.backend {
        EmbeddingBackend::FastEmbed => Arc::new(FastEmbedProvider::new().await?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embedding.hashing_dimension)),
    };
    tracing::info!("Embedding with {} ({} dims)", provider.model_name(), provider.dimension());
    Ok(provider)
}

/// Load the aspect store, or build one from the built-in catalog if none was saved yet.
async fn load_aspects(
    path: &Path,
    provider: &dyn EmbeddingProvider,
    timeout: std::time::Duration,
) -> anyhow::Result<AspectStore> {
    if path.exists() {
        return Ok(AspectStore::load_from(path)?);
    }
    tracing::warn!(
        "No aspect store at {:?}, using the built-in catalog (run `distill aspects build` to persist it)",
        path
    );
    Ok(AspectStore::build_within(provider, &AspectCatalog::builtin()?, timeout).await?)
}

/// Initialize logging
fn init_logging(verbose: bool) {
    let filter = if verbose {
        "rfp_distill=debug,distill=debug,info"
    } else {
        "rfp_distill=info,distill=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
