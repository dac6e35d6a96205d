// SPDX-License-Identifier: Apache-2.0

//! Batch orchestration: walks the candidate layer set one layer at a time,
//! isolating failures per layer and aggregating everything into a run
//! summary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info};

use crate::catalog;
use crate::download;
use crate::error::Result;
use crate::fetch::{Credentials, HttpFetcher};
use crate::models::layer::LayerDescriptor;
use crate::models::report::{DownloadOutcome, DownloadStatus, RunSummary};
use crate::style::StyleStrategy;

/// Everything a run needs, built once at process start and threaded down.
/// Core logic never reads ambient global state.
#[derive(Debug)]
pub(crate) struct ExtractConfig {
    pub base_url: String,
    pub dest_dir: PathBuf,
    pub query: Option<String>,
    pub limit: Option<usize>,
    /// When unset, the first failed layer aborts the whole run.
    pub ignore_errors: bool,
    pub credentials: Option<Credentials>,
    pub style: StyleStrategy,
}

/// Path whose presence marks a layer as fully extracted.
///
/// The style document is the last artifact [`download::download_layer`]
/// writes, so finding it on disk means a prior run completed every step for
/// this layer.
pub(crate) fn completion_marker(dest_dir: &Path, layer: &LayerDescriptor) -> PathBuf {
    dest_dir.join(format!("{}.sld", layer.stripped_name()))
}

/// Extract every candidate layer, sequentially and in catalog order.
///
/// Failures while listing the catalog abort immediately (there is nothing to
/// iterate without a layer list); failures inside a single layer become that
/// layer's outcome and, depending on `ignore_errors`, either stop the run or
/// let it continue with the next candidate.
pub(crate) async fn run(config: &ExtractConfig) -> Result<RunSummary> {
    let started = Instant::now();
    let fetcher = HttpFetcher::new(config.credentials.clone());

    let mut candidates =
        catalog::list_layers(&fetcher, &config.base_url, config.query.as_deref()).await?;
    if let Some(limit) = config.limit {
        if limit < candidates.len() {
            candidates.truncate(limit);
        }
    }

    let total = candidates.len();
    info!(count = total, "processing layers");

    let mut outcomes = Vec::with_capacity(total);
    let mut aborted = false;
    for (index, layer) in candidates.iter().enumerate() {
        let outcome = if completion_marker(&config.dest_dir, layer).exists() {
            DownloadOutcome::skipped(layer)
        } else {
            match download::download_layer(
                layer,
                &config.base_url,
                &config.dest_dir,
                &fetcher,
                config.style,
            )
            .await
            {
                Ok(paths) => DownloadOutcome::downloaded(layer, paths),
                Err(err) => {
                    error!(layer = %layer.name, error = %err, "could not download layer");
                    DownloadOutcome::failed(layer, &err)
                }
            }
        };

        info!(
            "[{}] Layer {} ({}/{})",
            outcome.status,
            outcome.name,
            index + 1,
            total
        );
        let failed = outcome.status == DownloadStatus::Failed;
        outcomes.push(outcome);

        if failed && !config.ignore_errors {
            error!("stopping because --ignore-errors was not set and a layer failed");
            aborted = true;
            break;
        }
    }

    Ok(RunSummary {
        outcomes,
        duration: started.elapsed(),
        aborted,
    })
}
