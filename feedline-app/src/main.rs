use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use feed::{Feed, instagram_provider};
use feedline_common::observability::init_logging;
use feedline_config::{FeedlineConfig, FeedlineConfigLoader, ProviderDetails};
use std::path::PathBuf;
mod feed;

#[derive(Parser)]
#[command(name = "feedline", about = "Fetch and normalize posts from social networks")]
struct Cli {
    /// YAML config; `FEEDLINE__*` variables override it.
    #[arg(long, env = "FEEDLINE_CONFIG", default_value = "feedline.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every enabled provider once and print the merged posts as JSON.
    Fetch {
        #[arg(long)]
        pretty: bool,
    },
    /// Exchange an Instagram authorization code and print the token response.
    InstagramAuth {
        /// Provider id from the config file.
        #[arg(long)]
        provider: String,
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg: FeedlineConfig = FeedlineConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let log_path = init_logging(cfg.logging.to_log_config("feedline"))?;
    tracing::debug!(path = %log_path.display(), "logging.ready");

    match cli.command {
        Command::Fetch { pretty } => fetch(&cfg, pretty).await,
        Command::InstagramAuth { provider, code } => instagram_auth(&cfg, &provider, &code).await,
    }
}

async fn fetch(cfg: &FeedlineConfig, pretty: bool) -> Result<()> {
    let feed = Feed::build_from_config(cfg)?;
    if feed.is_empty() {
        bail!("no enabled providers in config");
    }

    let report = feed.collect().await;
    for failure in &report.failures {
        eprintln!("{}: {}", failure.provider_id, failure.error);
        if let Some(body) = failure.error.error.body() {
            eprintln!("  response: {body}");
        }
    }
    if report.posts.is_empty() && report.failures.len() == feed.len() {
        bail!("every provider failed");
    }

    let out = if pretty {
        serde_json::to_string_pretty(&report.posts)?
    } else {
        serde_json::to_string(&report.posts)?
    };
    println!("{out}");
    Ok(())
}

async fn instagram_auth(cfg: &FeedlineConfig, id: &str, code: &str) -> Result<()> {
    let spec = cfg
        .provider(id)
        .with_context(|| format!("no provider `{id}` in config"))?;
    let ProviderDetails::Instagram { config } = &spec.details else {
        bail!("provider `{id}` is not an instagram provider");
    };

    let provider = instagram_provider(config)?;
    let body = provider
        .initialize(code)
        .await
        .context("instagram token exchange failed")?;
    println!("{body}");
    Ok(())
}
