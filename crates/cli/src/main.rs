//! PaperGraph CLI
//!
//! The binary entry point. Handles:
//! - Flag parsing and config-file/environment layering
//! - Logging initialization
//! - The build / export / view / inspect / cache subcommands

mod export;
mod view;

use clap::{Parser, Subcommand, ValueEnum};
use papergraph_common::config::{AppConfig, Spine};
use papergraph_common::errors::Result;
use papergraph_common::http::{ResponseCache, Transport};
use papergraph_common::store::Store;
use papergraph_engine::builder::{BuildRequest, GraphBuilder};
use papergraph_engine::sources::create_adapter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "papergraph", version, about = "Citation graphs over academic papers")]
struct Cli {
    /// Log verbosity: error, warn, info, debug
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a citation graph from a topic, titles, or DOIs
    Build(BuildArgs),
    /// Export a built graph to another file format
    Export(ExportArgs),
    /// Emit a self-contained HTML viewer for a built graph
    View(ViewArgs),
    /// Print store statistics
    Inspect(InspectArgs),
    /// Manage the HTTP response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Topic query used to seed the graph
    #[arg(long)]
    topic: Option<String>,

    /// Paper titles to seed from (repeatable)
    #[arg(long = "paper")]
    papers: Vec<String>,

    /// DOIs to seed from (repeatable)
    #[arg(long = "doi")]
    dois: Vec<String>,

    /// Bibliographic source
    #[arg(long)]
    source: Option<String>,

    /// Edge classes to emit
    #[arg(long, value_enum)]
    spine: Option<SpineArg>,

    /// BFS traversal depth
    #[arg(long)]
    depth: Option<usize>,

    /// Hard cap on persisted papers
    #[arg(long)]
    max_papers: Option<usize>,

    /// References fetched per paper
    #[arg(long = "max-refs")]
    max_refs: Option<usize>,

    /// Citations fetched per paper
    #[arg(long = "max-cites")]
    max_cites: Option<usize>,

    /// Earliest publication year to keep
    #[arg(long)]
    year_from: Option<i32>,

    /// Latest publication year to keep
    #[arg(long)]
    year_to: Option<i32>,

    /// Output database path
    #[arg(long)]
    out: Option<PathBuf>,

    /// Explicit config file (bypasses discovery)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable the HTTP response cache for this run
    #[arg(long)]
    no_cache: bool,
}

/// clap-facing mirror of [`Spine`]
#[derive(Clone, Copy, ValueEnum)]
enum SpineArg {
    Citation,
    Similarity,
    #[value(name = "co-citation")]
    CoCitation,
    Coupling,
    Hybrid,
}

impl From<SpineArg> for Spine {
    fn from(arg: SpineArg) -> Self {
        match arg {
            SpineArg::Citation => Spine::Citation,
            SpineArg::Similarity => Spine::Similarity,
            SpineArg::CoCitation => Spine::CoCitation,
            SpineArg::Coupling => Spine::Coupling,
            SpineArg::Hybrid => Spine::Hybrid,
        }
    }
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Built database to read
    #[arg(long)]
    input: PathBuf,

    /// Output format
    #[arg(long, value_enum)]
    format: export::Format,

    /// Output path (defaults next to the input)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Built database to read
    #[arg(long)]
    input: PathBuf,

    /// Output HTML path (defaults next to the input)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// Built database to read
    #[arg(long)]
    input: PathBuf,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete every cached response
    Clear,
    /// Print entry count and total size
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = ?e.code(), error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build(args) => build(args).await,
        Command::Export(args) => {
            let out = args.out.unwrap_or_else(|| {
                args.input.with_extension(args.format.extension())
            });
            let store = Store::open(&args.input)?;
            export::export(&store, args.format, &out)?;
            info!(out = %out.display(), "Export written");
            Ok(())
        }
        Command::View(args) => {
            let out = args.out.unwrap_or_else(|| args.input.with_extension("html"));
            let store = Store::open(&args.input)?;
            view::write_viewer(&store, &out)?;
            info!(out = %out.display(), "Viewer written");
            Ok(())
        }
        Command::Inspect(args) => {
            let store = Store::open(&args.input)?;
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Command::Cache { action } => {
            let config = AppConfig::load(None)?;
            let cache = ResponseCache::new(
                &config.cache.dir,
                Duration::from_secs(config.cache.ttl_secs),
            )?;
            match action {
                CacheAction::Clear => {
                    let removed = cache.clear()?;
                    info!(removed, dir = %cache.dir().display(), "Cache cleared");
                }
                CacheAction::Stats => {
                    let (entries, bytes) = cache.stats()?;
                    println!(
                        "{}",
                        serde_json::json!({
                            "dir": cache.dir().display().to_string(),
                            "entries": entries,
                            "bytes": bytes,
                        })
                    );
                }
            }
            Ok(())
        }
    }
}

async fn build(args: BuildArgs) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;

    // CLI flags take precedence over file and environment
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(spine) = args.spine {
        config.spine = spine.into();
    }
    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(max_papers) = args.max_papers {
        config.max_papers = max_papers;
    }
    if let Some(max_refs) = args.max_refs {
        config.max_refs_per_paper = max_refs;
    }
    if let Some(max_cites) = args.max_cites {
        config.max_cites_per_paper = max_cites;
    }
    if let Some(year_from) = args.year_from {
        config.year_from = Some(year_from);
    }
    if let Some(year_to) = args.year_to {
        config.year_to = Some(year_to);
    }
    if let Some(out) = args.out {
        config.out = out;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    config.validate()?;

    if args.topic.is_none() && args.papers.is_empty() && args.dois.is_empty() {
        return Err(papergraph_common::errors::AppError::NoSeeds);
    }

    let cache = if config.cache.enabled {
        Some(ResponseCache::new(
            &config.cache.dir,
            Duration::from_secs(config.cache.ttl_secs),
        )?)
    } else {
        None
    };
    let transport = Arc::new(Transport::new(
        config.http.clone(),
        &config.contact_email,
        cache,
    )?);
    let adapter = create_adapter(&config.source, transport.clone(), &config)?;

    info!(
        version = papergraph_common::VERSION,
        source = %config.source,
        spine = %config.spine,
        out = %config.out.display(),
        "Starting build"
    );

    let request = BuildRequest {
        topic: args.topic,
        titles: args.papers,
        dois: args.dois,
    };
    let out = GraphBuilder::new(config, adapter, transport)
        .build(&request)
        .await?;
    info!(out = %out.display(), "Graph stored");
    Ok(())
}
