// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One page of the catalog search endpoint's JSON response.
#[derive(Deserialize, Debug)]
pub(crate) struct SearchPage {
    /// Total number of layers the catalog reports for this query.
    pub total: Option<u64>,
    /// Layer entries carried by this page. Older catalog builds name this
    /// field `rows` on continuation pages; both spellings parse here.
    #[serde(default, alias = "rows")]
    pub results: Vec<LayerDescriptor>,
    /// Cursor for the next page, when the catalog has more results.
    pub next: Option<String>,
    /// Application-level failure flag; `false` means the search itself failed.
    pub success: Option<bool>,
    /// Remote-reported error texts accompanying `success: false`.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A single catalog entry: one named geospatial dataset and its artifact links.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub(crate) struct LayerDescriptor {
    /// Stable identifier, optionally carrying a `namespace:` prefix. The full
    /// qualified name is what upstream endpoints are queried with.
    pub name: String,
    /// Human-readable display label.
    #[serde(default)]
    pub title: String,
    /// Map from format tag (`zip`, `tiff`, plus auxiliary `xml` and `sld`) to
    /// the resource serving that representation.
    #[serde(default)]
    pub links: HashMap<String, ResourceLink>,
}

/// One downloadable representation of a layer.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub(crate) struct ResourceLink {
    pub url: String,
    /// File extension advertised for this format, including the leading dot.
    pub extension: Option<String>,
}

impl LayerDescriptor {
    /// Layer name without its namespace prefix. This is the form used for
    /// display, derived local filenames, and the skip check; keeping a single
    /// implementation stops the resume marker from drifting out of sync.
    pub(crate) fn stripped_name(&self) -> &str {
        strip_namespace(&self.name)
    }
}

/// Drops the `namespace:` prefix from a layer name. Names without a prefix
/// pass through unchanged, and the operation is idempotent.
pub(crate) fn strip_namespace(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, bare)) => bare,
        None => name,
    }
}
