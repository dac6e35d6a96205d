// SPDX-License-Identifier: Apache-2.0

mod catalog;
mod download;
mod error;
mod fetch;
mod format;
mod models;
mod run;
mod style;
mod xml;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::Level;

use crate::fetch::{Credentials, HttpFetcher};
use crate::models::report::{DownloadStatus, RunSummary};
use crate::run::ExtractConfig;
use crate::style::StyleStrategy;

/// Mirror the layers of a remote geospatial catalog to local disk.
///
/// For every layer the catalog search returns, downloads its data payload,
/// metadata document, and cartographic style into the destination directory.
/// Already-extracted layers are skipped, so an interrupted run can simply be
/// restarted.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the catalog, for example https://demo.geonode.org
    catalog_url: String,

    /// Directory the extracted artifacts are written to
    #[arg(short, long, default_value = "data", value_name = "PATH")]
    dest_dir: PathBuf,

    /// Catalog username for protected endpoints
    #[arg(short, long)]
    username: Option<String>,

    /// Catalog password for protected endpoints
    #[arg(short, long)]
    password: Option<String>,

    /// Keep going after a layer fails instead of aborting the run
    #[arg(short, long)]
    ignore_errors: bool,

    /// Extract at most this many layers
    #[arg(short, long)]
    limit: Option<usize>,

    /// Free-text search term to filter the layer list
    #[arg(short, long)]
    query: Option<String>,

    /// Extract a single layer by name instead of the full catalog
    #[arg(long, conflicts_with_all = ["query", "limit"])]
    layer: Option<String>,

    /// Write placeholder styles instead of querying the style endpoint
    #[arg(long)]
    placeholder_styles: bool,

    /// Increase output verbosity; may be given multiple times
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let credentials = match (&cli.username, &cli.password) {
        (Some(username), Some(password)) => Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        }),
        (None, None) => None,
        _ => bail!("--username and --password must be supplied together"),
    };
    let style = if cli.placeholder_styles {
        StyleStrategy::Placeholder
    } else {
        StyleStrategy::Indirect
    };

    if let Some(name) = &cli.layer {
        return extract_single(&cli, name, credentials, style).await;
    }

    let config = ExtractConfig {
        base_url: cli.catalog_url.clone(),
        dest_dir: cli.dest_dir.clone(),
        query: cli.query.clone(),
        limit: cli.limit,
        ignore_errors: cli.ignore_errors,
        credentials,
        style,
    };

    println!(
        "Getting data from \"{}\" into \"{}\"",
        config.base_url,
        config.dest_dir.display()
    );
    let summary = run::run(&config)
        .await
        .with_context(|| format!("Failed to extract layers from '{}'", config.base_url))?;

    print_summary(&summary);

    if summary.aborted {
        let culprit = summary
            .outcomes
            .iter()
            .rev()
            .find(|outcome| outcome.status == DownloadStatus::Failed)
            .map(|outcome| outcome.name.as_str())
            .unwrap_or("unknown");
        bail!("run aborted after layer '{culprit}' failed");
    }
    Ok(())
}

async fn extract_single(
    cli: &Cli,
    name: &str,
    credentials: Option<Credentials>,
    style: StyleStrategy,
) -> Result<()> {
    let fetcher = HttpFetcher::new(credentials);
    let paths =
        download::download_named_layer(name, &cli.catalog_url, &cli.dest_dir, &fetcher, style)
            .await
            .with_context(|| format!("Failed to extract layer '{name}'"))?;

    println!("Extracted layer {name}");
    if let Some(data) = &paths.data {
        println!("  data:     {}", data.display());
    }
    if let Some(metadata) = &paths.metadata {
        println!("  metadata: {}", metadata.display());
    }
    if let Some(style_path) = &paths.style {
        println!("  style:    {}", style_path.display());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let failures: Vec<_> = summary
        .outcomes
        .iter()
        .filter(|outcome| outcome.status == DownloadStatus::Failed)
        .collect();

    if !failures.is_empty() {
        println!("\nDetailed report of failures:");
        for outcome in &failures {
            println!("{}", outcome.name);
            if let Some(failure) = &outcome.failure {
                println!("  {}", failure.message);
                for cause in &failure.chain {
                    println!("  caused by: {cause}");
                }
            }
        }
    }

    println!(
        "\nFinished processing {} layers in {:.2} seconds.",
        summary.outcomes.len(),
        summary.duration.as_secs_f64()
    );
    println!(
        "{} Downloaded layers",
        summary.count(DownloadStatus::Downloaded)
    );
    println!("{} Failed layers", summary.count(DownloadStatus::Failed));
    println!("{} Skipped layers", summary.count(DownloadStatus::Skipped));
    println!("{:.2} seconds per layer", summary.seconds_per_layer());
}

/// Each `-v` on the command line lowers the tracing threshold one step.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
