// SPDX-License-Identifier: Apache-2.0

use crate::error::{ExtractError, Result};
use crate::models::layer::{LayerDescriptor, ResourceLink};

/// Payload formats accepted for extraction, most preferred first. The archive
/// format comes ahead of the raster format.
pub(crate) const SUPPORTED_FORMATS: &[&str] = &["zip", "tiff"];

/// Picks the first entry of `priority` that the layer offers a link for.
///
/// First-match, not best-match: the same `links` and `priority` always yield
/// the same tag. When nothing matches, the error lists what was required and
/// what the layer actually offered.
pub(crate) fn resolve_format<'l, 'p>(
    layer: &'l LayerDescriptor,
    priority: &'p [&'p str],
) -> Result<(&'p str, &'l ResourceLink)> {
    for &tag in priority {
        if let Some(link) = layer.links.get(tag) {
            return Ok((tag, link));
        }
    }

    let mut offered: Vec<&str> = layer.links.keys().map(String::as_str).collect();
    offered.sort_unstable();
    Err(ExtractError::UnsupportedFormat {
        layer: layer.stripped_name().to_string(),
        wanted: priority.join(", "),
        offered: offered.join(", "),
    })
}
