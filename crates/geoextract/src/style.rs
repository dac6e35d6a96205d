// SPDX-License-Identifier: Apache-2.0

//! Style resolution for a layer.
//!
//! Catalogs differ in how styles are exposed, so the fetcher is a strategy:
//! either a fixed placeholder document, or an indirect lookup through the
//! layer's description resource.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::fetch::HttpFetcher;
use crate::models::layer::strip_namespace;

/// Fixed relative path of the per-layer description resource.
const LAYER_REST_PATH: &str = "rest/layers";

/// Style document served by the placeholder strategy.
const PLACEHOLDER_SLD: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<StyledLayerDescriptor version="1.0.0" xmlns="http://www.opengis.net/sld">
  <NamedLayer>
    <Name>default</Name>
  </NamedLayer>
</StyledLayerDescriptor>
"#;

/// How a layer's style document is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StyleStrategy {
    /// Return a fixed placeholder document; for catalogs without a usable
    /// style endpoint.
    Placeholder,
    /// Fetch the layer description resource, follow its default-style
    /// reference, and download the raw style document.
    Indirect,
}

/// Wire shape of the layer description resource. Only the default-style
/// reference is needed; everything else the endpoint returns is ignored.
#[derive(Deserialize, Debug)]
struct LayerDescription {
    layer: DescribedLayer,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DescribedLayer {
    default_style: StyleRef,
}

#[derive(Deserialize, Debug)]
struct StyleRef {
    href: String,
}

/// Resolve the style document for `layer_name` using `strategy`.
pub(crate) async fn fetch_style(
    strategy: StyleStrategy,
    fetcher: &HttpFetcher,
    base_url: &str,
    layer_name: &str,
) -> Result<Vec<u8>> {
    match strategy {
        StyleStrategy::Placeholder => Ok(PLACEHOLDER_SLD.to_vec()),
        StyleStrategy::Indirect => fetch_indirect(fetcher, base_url, layer_name).await,
    }
}

async fn fetch_indirect(
    fetcher: &HttpFetcher,
    base_url: &str,
    layer_name: &str,
) -> Result<Vec<u8>> {
    let bare = strip_namespace(layer_name);
    let description_url = format!(
        "{}/{}/{}.json",
        base_url.trim_end_matches('/'),
        LAYER_REST_PATH,
        bare
    );

    let response = fetcher.get(&description_url, &[]).await?;
    if response.status == StatusCode::UNAUTHORIZED {
        return Err(ExtractError::AuthenticationRequired {
            url: description_url,
        });
    }
    if !response.is_success() {
        return Err(ExtractError::Upstream {
            url: description_url,
            status: response.status.as_u16(),
            body: response.body_text(),
        });
    }

    let description: LayerDescription = serde_json::from_slice(&response.body).map_err(|e| {
        ExtractError::Structural(format!(
            "layer description at {description_url} is missing layer.defaultStyle.href: {e}"
        ))
    })?;
    let href = description.layer.default_style.href;
    debug!(layer = layer_name, href = %href, "resolved default style reference");

    // The description endpoint hands out a reference to the style's own
    // descriptor document; the raw document lives at the same path with the
    // style extension.
    let style_url = match href.strip_suffix(".json") {
        Some(stem) => format!("{stem}.sld"),
        None => {
            return Err(ExtractError::Structural(format!(
                "style reference \"{href}\" does not point at a descriptor document"
            )));
        }
    };

    let style = fetcher.get(&style_url, &[]).await?;
    if !style.is_success() {
        return Err(ExtractError::Upstream {
            url: style_url,
            status: style.status.as_u16(),
            body: style.body_text(),
        });
    }
    Ok(style.body)
}
