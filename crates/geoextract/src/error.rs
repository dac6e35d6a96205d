// SPDX-License-Identifier: Apache-2.0

/// Errors produced by the extraction pipeline.
///
/// Variants are the branching representation: callers match on them to decide
/// whether a failure aborts the run, is reported against a single layer, or
/// needs operator action. The human-facing report form lives on the layer's
/// download outcome instead.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ExtractError {
    /// The transport could not reach the remote endpoint at all.
    #[error("could not connect to {url}, are you sure you are connected to the internet?")]
    Connectivity {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The search endpoint responded but signaled an application-level failure.
    #[error("catalog search returned the following errors: {0}")]
    Catalog(String),

    /// None of the acceptable payload formats is offered for a layer.
    #[error(
        "only \"{wanted}\" are supported for the extract, available formats for \"{layer}\" are: \"{offered}\""
    )]
    UnsupportedFormat {
        layer: String,
        wanted: String,
        offered: String,
    },

    /// An advertised link did not resolve to a usable artifact.
    #[error("layer \"{layer}\" did not have a valid download link \"{url}\"")]
    InvalidLink { layer: String, url: String },

    /// A protected endpoint rejected anonymous access.
    #[error("{url} requires authentication, supply --username and --password")]
    AuthenticationRequired { url: String },

    /// A remote document violates the shape the pipeline expects.
    #[error("{0}")]
    Structural(String),

    /// Any other non-success response from a remote endpoint.
    #[error("{url} answered HTTP {status}: {body}")]
    Upstream {
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Convenience alias used throughout the crate.
pub(crate) type Result<T> = std::result::Result<T, ExtractError>;
