//! trendstitch CLI
//!
//! Tracks search interest for a set of keywords and emits one continuous,
//! consistently scaled series per keyword.

mod config;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::FileConfig;
use trends_client::{create_source, TrendsConfig};
use trends_core::format_utc;
use trends_runtime::{Emitter, JsonLinesEmitter, Poller, PollerConfig};

#[derive(Parser)]
#[command(name = "trendstitch")]
#[command(author, version, about = "Stitch relative search-interest windows into one series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll keywords and emit their stitched series as JSON lines
    Track {
        /// Keywords or phrases to track
        keywords: Vec<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        client: ClientArgs,

        /// Seconds between polling rounds
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Milliseconds to wait after each keyword query
        #[arg(long)]
        query_delay_ms: Option<u64>,

        /// Stop after this many rounds (0 = run forever)
        #[arg(long)]
        rounds: Option<u64>,

        /// Keywords fetched in parallel
        #[arg(long)]
        concurrency: Option<usize>,

        /// Write records to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include an RFC 3339 UTC time in every record
        #[arg(long)]
        utc: bool,
    },

    /// Fetch a single raw window and print it
    Probe {
        /// Keyword or phrase to query
        keyword: String,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        client: ClientArgs,
    },
}

/// Data-source overrides shared by all subcommands
#[derive(Args)]
struct ClientArgs {
    /// Region code
    #[arg(long)]
    geo: Option<String>,

    /// Query window (e.g. "now 4-H", "now 1-d")
    #[arg(long)]
    timeframe: Option<String>,

    /// Interface language
    #[arg(long)]
    language: Option<String>,

    /// Proxy URL (or set TRENDS_PROXY env var)
    #[arg(long, env = "TRENDS_PROXY")]
    proxy: Option<String>,
}

impl ClientArgs {
    fn apply(self, config: &mut TrendsConfig) {
        if let Some(geo) = self.geo {
            config.geo = geo;
        }
        if let Some(timeframe) = self.timeframe {
            config.timeframe = timeframe;
        }
        if let Some(language) = self.language {
            config.language = language;
        }
        if self.proxy.is_some() {
            config.proxy = self.proxy;
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::load(&path),
        None => Ok(FileConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Track {
            keywords,
            config,
            client,
            interval_secs,
            query_delay_ms,
            rounds,
            concurrency,
            output,
            utc,
        } => {
            let mut file = load_config(config)?;
            client.apply(&mut file.client);
            if !keywords.is_empty() {
                file.keywords = keywords;
            }
            file.poll_interval_secs = interval_secs.unwrap_or(file.poll_interval_secs);
            file.query_delay_ms = query_delay_ms.unwrap_or(file.query_delay_ms);
            file.max_rounds = rounds.unwrap_or(file.max_rounds);
            file.max_concurrent = concurrency.unwrap_or(file.max_concurrent);
            file.emit_utc |= utc;

            run_track(file, output).await?;
        }
        Commands::Probe {
            keyword,
            config,
            client,
        } => {
            let mut file = load_config(config)?;
            client.apply(&mut file.client);
            run_probe(&keyword, file.client).await?;
        }
    }

    Ok(())
}

async fn run_track(config: FileConfig, output: Option<PathBuf>) -> Result<()> {
    if config.keywords.is_empty() {
        anyhow::bail!("No keywords specified. Pass them as arguments or list them in --config.");
    }

    info!(
        "Geo: {} | Timeframe: {} | Interval: {}s",
        config.client.geo, config.client.timeframe, config.poll_interval_secs
    );

    let source = create_source(config.client)?;

    let emitter: Box<dyn Emitter> = match &output {
        Some(path) => {
            info!("Writing records to {}", path.display());
            Box::new(JsonLinesEmitter::new(BufWriter::new(File::create(path)?)))
        }
        None => Box::new(JsonLinesEmitter::stdout()),
    };

    let mut poller = Poller::new(
        PollerConfig {
            source,
            keywords: config.keywords,
            poll_interval_secs: config.poll_interval_secs,
            query_delay_ms: config.query_delay_ms,
            max_rounds: config.max_rounds,
            max_concurrent: config.max_concurrent,
            emit_utc: config.emit_utc,
        },
        emitter,
    )?;

    let rounds = poller.run().await?;
    info!("Finished after {} rounds", rounds);

    Ok(())
}

async fn run_probe(keyword: &str, config: TrendsConfig) -> Result<()> {
    info!("Probing '{}' ({}, {})", keyword, config.geo, config.timeframe);

    let source = create_source(config)?;
    let window = source.fetch_window(keyword).await?;

    println!("{} samples for '{}'", window.len(), keyword);
    for (timestamp, value) in window.iter() {
        let utc = format_utc(timestamp).unwrap_or_default();
        println!("{}\t{}\t{}", timestamp, utc, value);
    }

    Ok(())
}
