use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod config;
mod discogs;
mod error;
mod pacer;
mod server;
mod snapshot;
mod sync;

use config::{DEFAULT_API_BASE, DEFAULT_USERNAME, DiscogsConfig, ServeConfig, USER_AGENT};

#[derive(Parser, Debug)]
#[command(name = "cogsync")]
#[command(about = "Mirror a Discogs collection to static JSON and serve it", version, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Snapshot the whole collection into the data directory
    Fetch(DiscogsArgs),

    /// Serve the front end, the cached data and a proxy to the Discogs API
    Serve {
        #[command(flatten)]
        discogs: DiscogsArgs,

        /// Server port
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory holding index.html
        #[arg(long, default_value = ".")]
        static_dir: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct DiscogsArgs {
    /// Discogs personal access token
    #[arg(long, env = "DISCOGS_TOKEN", hide_env_values = true)]
    token: String,

    /// Discogs username whose collection is mirrored
    #[arg(short, long, env = "DISCOGS_USERNAME", default_value = DEFAULT_USERNAME)]
    username: String,

    /// Discogs API base URL
    #[arg(long, env = "DISCOGS_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: Url,

    /// Data directory for folders.json and collection.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// User-Agent sent to Discogs
    #[arg(long, default_value = USER_AGENT)]
    user_agent: String,
}

impl From<DiscogsArgs> for DiscogsConfig {
    fn from(args: DiscogsArgs) -> Self {
        Self {
            api_base: args.api_base,
            username: args.username,
            token: args.token,
            user_agent: args.user_agent,
            data_dir: args.data_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cogsync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Fetch(discogs) => {
            let config = DiscogsConfig::from(discogs);
            config.validate().context("Invalid Discogs configuration")?;
            match sync::run(&config, Arc::new(pacer::TokioClock)).await {
                Ok(summary) => {
                    tracing::info!("Successfully fetched {} releases", summary.releases);
                    tracing::info!("Data saved to {}", summary.output.display());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error fetching Discogs data");
                    return Err(e).context("Error fetching Discogs data");
                }
            }
        }
        Command::Serve {
            discogs,
            port,
            host,
            static_dir,
        } => {
            server::serve(ServeConfig {
                discogs: discogs.into(),
                host,
                port,
                static_dir,
            })
            .await?;
        }
    }

    Ok(())
}
