//! gt - Sweep your own Twitter timeline
//!
//! `gt delete` removes everything on the authenticated user's timeline:
//! original posts are deleted and reposts are undone, one page at a time,
//! until the timeline comes back empty.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use libgtsweep::config::expand_path;
use libgtsweep::logging::LoggingConfig;
use libgtsweep::platforms::twitter::TwitterClient;
use libgtsweep::sweeper::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use libgtsweep::{
    CredentialField, CredentialResolver, GtSweepError, PartialCredentials, Removal, Result,
    SweepConfig, SweepEvent, Sweeper,
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "gt")]
#[command(about = "Clean up your Twitter timeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete every post and undo every repost on your timeline
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct DeleteArgs {
    /// Post ID (currently unused; the whole timeline is swept)
    #[arg(short, long)]
    post_id: Option<u64>,

    /// Config file to read credentials from (default: ~/.gtrc)
    #[arg(short, long)]
    config_file: Option<String>,

    /// Twitter username
    #[arg(short, long)]
    user: Option<String>,

    /// OAuth consumer key
    #[arg(short = 'k', long)]
    consumer_key: Option<String>,

    /// OAuth consumer secret
    #[arg(short = 's', long)]
    consumer_secret: Option<String>,

    /// OAuth access token
    #[arg(short = 'T', long)]
    access_token: Option<String>,

    /// OAuth access token secret
    #[arg(short = 'S', long)]
    access_secret: Option<String>,

    /// Items to request per page (1-200)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Pause before each delete or unretweet (e.g. "1s", "500ms")
    #[arg(long, default_value = "1s")]
    delay: String,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Alternative API root
    #[arg(long, hide = true)]
    api_base: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Delete(args) => delete(args, cli.format).await,
    }
}

async fn delete(args: DeleteArgs, format: OutputFormat) -> Result<()> {
    if let Some(post_id) = &args.post_id {
        debug!("Ignoring --post-id {}", post_id);
    }

    let sweep_config = sweep_config(&args)?;

    let overrides = PartialCredentials::default()
        .with(CredentialField::User, args.user)
        .with(CredentialField::ConsumerKey, args.consumer_key)
        .with(CredentialField::ConsumerSecret, args.consumer_secret)
        .with(CredentialField::AccessToken, args.access_token)
        .with(CredentialField::AccessSecret, args.access_secret);

    let credentials = CredentialResolver::new(overrides)
        .with_config_file(args.config_file.as_deref().map(expand_path))
        .resolve()?;

    let mut client = TwitterClient::new(&credentials)?;
    if let Some(api_base) = args.api_base {
        client = client.with_base_url(api_base);
    }
    info!(
        "Sweeping timeline of {} via {}",
        client.username(),
        client.base_url()
    );

    let sweeper = Sweeper::new(&client, sweep_config);
    sweeper
        .run_with(|event| {
            if let Err(e) = render_event(event, format) {
                warn!("{:#}", e);
            }
        })
        .await?;

    Ok(())
}

/// Validate the tuning flags
fn sweep_config(args: &DeleteArgs) -> Result<SweepConfig> {
    if args.page_size == 0 || args.page_size > MAX_PAGE_SIZE {
        return Err(GtSweepError::InvalidInput(format!(
            "--page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, args.page_size
        )));
    }

    if args.max_pages == Some(0) {
        return Err(GtSweepError::InvalidInput(
            "--max-pages must be at least 1".to_string(),
        ));
    }

    let action_delay = parse_delay(&args.delay)?;

    Ok(SweepConfig {
        page_size: args.page_size,
        action_delay,
        max_pages: args.max_pages,
        ..Default::default()
    })
}

fn parse_delay(value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        GtSweepError::InvalidInput(format!("Invalid --delay '{}': {}", value, e))
    })
}

fn render_event(event: &SweepEvent, format: OutputFormat) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(event).context("Failed to serialize sweep event")?;
            writeln!(stdout, "{}", line).context("Failed to write to stdout")?;
        }
        OutputFormat::Text => {
            if let Some(line) = text_line(event) {
                writeln!(stdout, "{}", line).context("Failed to write to stdout")?;
            }
        }
    }

    Ok(())
}

fn text_line(event: &SweepEvent) -> Option<String> {
    match event {
        SweepEvent::PageFetched { items: 0, .. } => {
            Some("No more posts on the timeline.".to_string())
        }
        SweepEvent::PageFetched { page, items } => {
            Some(format!("Page {}: {} item(s)", page, items))
        }
        SweepEvent::Removed {
            index, action, text, ..
        } => {
            let verb = match action {
                Removal::Delete => "Deleted",
                Removal::Unretweet => "Unretweeted",
            };
            Some(format!("[{}] {}: '{}'", index, verb, text))
        }
        SweepEvent::RemovalFailed {
            index,
            id,
            action,
            error,
            ..
        } => Some(format!("[{}] Failed to {} {}: {}", index, action, id, error)),
        // Already logged at warn level
        SweepEvent::FetchFailed { .. } | SweepEvent::Throttled { .. } => None,
        SweepEvent::Finished { report } => Some(format!(
            "Done: {} deleted, {} unretweeted, {} failed",
            report.deleted, report.unretweeted, report.failed
        )),
    }
}
