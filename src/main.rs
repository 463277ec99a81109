mod error;
mod sources;

use crate::error::{ErrorKind, Result};
use b2_booru::{BooruHandle, Listing, Post, search_from_start};
use b2_config::Config;
use clap::{ArgAction, Parser, Subcommand};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "b2", version, about = "Browse tagged media collections", long_about = None)]
struct Cli {
    /// Read this configuration file instead of the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log more; repeat for even more (RUST_LOG takes precedence)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured sources
    Sources,
    /// Search a source, newest posts first
    Search {
        /// Source to search instead of the default
        #[arg(short, long)]
        source: Option<String>,
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
        /// Print each post's tags
        #[arg(long = "tags")]
        show_tags: bool,
        /// Tags every post must have; none lists everything
        tags: Vec<String>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", *err);
            if let Some(suggestion) = err.recovery_suggestion() {
                eprintln!("{suggestion}");
            }
            debug!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Sources => {
            list_sources(&config).await;
            Ok(())
        },
        Command::Search { source, pages, show_tags, tags } => {
            let booru = match config.select(source.as_deref()).or_raise(|| ErrorKind::Config)? {
                Some((name, source)) => sources::open(name, source).await?,
                None => {
                    info!("no sources configured");
                    sources::unconfigured()
                },
            };
            let posts = collect(&booru, &tags, pages).await?;
            for post in &posts {
                print_post(post, show_tags).await;
            }
            Ok(())
        },
    }
}

async fn list_sources(config: &Config) {
    if config.sources.is_empty() {
        println!("no sources configured");
        return;
    }
    for (name, source) in &config.sources {
        let marker = if config.default_source.as_deref() == Some(name.as_str()) { "*" } else { " " };
        // Only opening a source tells us how it paginates.
        let pagination = match sources::open(name, source).await {
            Ok(booru) => booru.identity().preferred_pagination().to_string(),
            Err(err) => format!("unavailable: {}", *err),
        };
        println!("{marker} {name}\t{}\t{pagination}", source.kind());
    }
}

/// Load up to `pages` chunks of posts matching `tags`.
async fn collect(booru: &BooruHandle, tags: &[String], pages: u32) -> Result<Vec<Post>> {
    let first = if tags.is_empty() {
        booru.initial_posts().await
    } else {
        search_from_start(booru.as_ref(), tags).await
    };
    let Some(listing) = Listing::start(first.map_err(error::booru)?, booru) else {
        return Ok(Vec::new());
    };
    for _ in 1..pages {
        if listing.load_more(tags).await.map_err(error::booru)?.is_empty() {
            break;
        }
    }
    debug!(count = listing.count(), exhausted = listing.is_exhausted(), "listing loaded");
    Ok(listing.posts())
}

async fn print_post(post: &Post, show_tags: bool) {
    println!("{}\t{}\t{}\t{}", post.global_id, post.mime, post.size, post.image_url());
    if show_tags {
        let tags: Vec<String> = post.tags().await.iter().map(ToString::to_string).collect();
        println!("\t{}", tags.join(" "));
    }
}
