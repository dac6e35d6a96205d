// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::ExtractError;
use crate::models::layer::LayerDescriptor;

/// Terminal status of one layer's extraction attempt.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DownloadStatus {
    Downloaded,
    Failed,
    Skipped,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded => f.write_str("downloaded"),
            Self::Failed => f.write_str("failed"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Report form of a failed attempt: the error message plus its rendered cause
/// chain. This is what gets stored and re-printed at the end of a run, so
/// nothing needs to re-inspect a live error value after the fact.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct FailureReport {
    pub message: String,
    /// Messages of the underlying causes, outermost first.
    pub chain: Vec<String>,
}

impl FailureReport {
    pub(crate) fn from_error(err: &ExtractError) -> Self {
        let mut chain = Vec::new();
        let mut cause = std::error::Error::source(err);
        while let Some(inner) = cause {
            chain.push(inner.to_string());
            cause = inner.source();
        }
        Self {
            message: err.to_string(),
            chain,
        }
    }
}

/// Paths written for one successfully extracted layer. Any entry may be
/// absent when the corresponding artifact was not obtainable.
#[derive(Serialize, Debug, Clone, Default)]
pub(crate) struct LayerOutputPaths {
    /// Payload, or the unpacked primary file for archive payloads.
    pub data: Option<PathBuf>,
    /// Metadata document.
    pub metadata: Option<PathBuf>,
    /// Cartographic style document.
    pub style: Option<PathBuf>,
}

/// One layer's outcome within a run.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct DownloadOutcome {
    pub name: String,
    pub title: String,
    pub status: DownloadStatus,
    pub paths: Option<LayerOutputPaths>,
    pub failure: Option<FailureReport>,
}

impl DownloadOutcome {
    pub(crate) fn downloaded(layer: &LayerDescriptor, paths: LayerOutputPaths) -> Self {
        Self {
            name: layer.name.clone(),
            title: layer.title.clone(),
            status: DownloadStatus::Downloaded,
            paths: Some(paths),
            failure: None,
        }
    }

    pub(crate) fn failed(layer: &LayerDescriptor, err: &ExtractError) -> Self {
        Self {
            name: layer.name.clone(),
            title: layer.title.clone(),
            status: DownloadStatus::Failed,
            paths: None,
            failure: Some(FailureReport::from_error(err)),
        }
    }

    pub(crate) fn skipped(layer: &LayerDescriptor) -> Self {
        Self {
            name: layer.name.clone(),
            title: layer.title.clone(),
            status: DownloadStatus::Skipped,
            paths: None,
            failure: None,
        }
    }
}

/// Aggregate result of a batch run.
#[derive(Debug)]
pub(crate) struct RunSummary {
    pub outcomes: Vec<DownloadOutcome>,
    /// Wall-clock duration of the whole run.
    pub duration: Duration,
    /// Whether the run stopped early because a layer failed and
    /// `--ignore-errors` was not set.
    pub aborted: bool,
}

impl RunSummary {
    pub(crate) fn count(&self, status: DownloadStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Average wall-clock seconds per processed layer; zero when nothing was
    /// processed.
    pub(crate) fn seconds_per_layer(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.duration.as_secs_f64() / self.outcomes.len() as f64
        }
    }
}
