// SPDX-License-Identifier: Apache-2.0

//! Per-layer extraction pipeline: the data payload (unpacked when it is an
//! archive) plus the metadata and style documents, written side by side
//! under the destination directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog;
use crate::error::{ExtractError, Result};
use crate::fetch::HttpFetcher;
use crate::format::{SUPPORTED_FORMATS, resolve_format};
use crate::models::layer::LayerDescriptor;
use crate::models::report::LayerOutputPaths;
use crate::style::{StyleStrategy, fetch_style};
use crate::xml;

/// Qualified name of the metadata element the catalog serves.
const METADATA_ELEMENT: &str = "gmd:MD_Metadata";

/// Download one layer's payload, metadata, and style into `dest_dir`.
///
/// The style document is deliberately written last: its presence on disk is
/// the completion marker the batch run's skip check relies on, so a present
/// `.sld` file means every earlier step finished in a prior run.
pub(crate) async fn download_layer(
    layer: &LayerDescriptor,
    base_url: &str,
    dest_dir: &Path,
    fetcher: &HttpFetcher,
    style: StyleStrategy,
) -> Result<LayerOutputPaths> {
    let mut paths = LayerOutputPaths::default();

    let (format, link) = resolve_format(layer, SUPPORTED_FORMATS)?;
    debug!(layer = %layer.name, format, url = %link.url, "resolved download format");

    let response = fetcher.get(&link.url, &[]).await?;
    if !response.is_success() {
        return Err(ExtractError::Upstream {
            url: link.url.clone(),
            status: response.status.as_u16(),
            body: response.body_text(),
        });
    }
    // A download link that does not name a file is advertising something it
    // cannot deliver.
    let Some(hint) = &response.filename_hint else {
        return Err(ExtractError::InvalidLink {
            layer: layer.name.clone(),
            url: link.url.clone(),
        });
    };

    // The file stem is always the stripped layer name so every artifact path
    // stays deterministic across runs; only the extension follows the server.
    let bare = layer.stripped_name();
    let extension = extension_of(hint)
        .or_else(|| link.extension.clone())
        .unwrap_or_else(|| format!(".{format}"));

    fs::create_dir_all(dest_dir)?;
    let base_path = dest_dir.join(bare);
    let payload_path = path_with_extension(&base_path, &extension);
    fs::write(&payload_path, &response.body)?;
    debug!(layer = %layer.name, path = %payload_path.display(), "saved payload");

    match unpack_payload(&payload_path, &base_path)? {
        PayloadKind::Unpacked { shapefile } => paths.data = shapefile,
        PayloadKind::Plain if extension == ".tiff" => paths.data = Some(payload_path.clone()),
        PayloadKind::Plain => {}
    }

    let metadata_link = layer.links.get("xml").ok_or_else(|| {
        ExtractError::Structural(format!(
            "layer \"{}\" advertises no xml metadata link",
            layer.name
        ))
    })?;
    let response = fetcher.get(&metadata_link.url, &[]).await?;
    if !response.is_success() {
        return Err(ExtractError::Upstream {
            url: metadata_link.url.clone(),
            status: response.status.as_u16(),
            body: response.body_text(),
        });
    }
    let metadata = xml::extract_single_element(&response.body, METADATA_ELEMENT)?;
    let metadata_path = path_with_extension(&base_path, ".xml");
    fs::write(&metadata_path, metadata)?;
    debug!(layer = %layer.name, path = %metadata_path.display(), "saved metadata");
    paths.metadata = Some(metadata_path);

    let style_bytes = fetch_style(style, fetcher, base_url, &layer.name).await?;
    // styles are usually XML; anything else is written as received
    let style_bytes = xml::pretty_print(&style_bytes).unwrap_or(style_bytes);
    let style_path = path_with_extension(&base_path, ".sld");
    fs::write(&style_path, style_bytes)?;
    debug!(layer = %layer.name, path = %style_path.display(), "saved style");
    paths.style = Some(style_path);

    Ok(paths)
}

/// Resolve a single layer by name through the catalog search, then run the
/// same pipeline on it.
pub(crate) async fn download_named_layer(
    name: &str,
    base_url: &str,
    dest_dir: &Path,
    fetcher: &HttpFetcher,
    style: StyleStrategy,
) -> Result<LayerOutputPaths> {
    let layer = catalog::find_layer(fetcher, base_url, name).await?;
    download_layer(&layer, base_url, dest_dir, fetcher, style).await
}

/// What the payload turned out to be once written to disk.
enum PayloadKind {
    /// A zip archive, now flattened next to `base`; carries the shapefile
    /// path when the archive contained one.
    Unpacked { shapefile: Option<PathBuf> },
    /// A plain single-file payload, left in place.
    Plain,
}

/// If `payload_path` is a valid zip archive, extract every file entry to
/// `base + entry_extension` and delete the archive.
///
/// The archive's internal directory layout is discarded, and an existing
/// file at a flattened destination is overwritten without warning.
fn unpack_payload(payload_path: &Path, base_path: &Path) -> Result<PayloadKind> {
    let file = fs::File::open(payload_path)?;
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(archive) => archive,
        // not an archive; the payload stays as downloaded
        Err(_) => return Ok(PayloadKind::Plain),
    };

    let mut shapefile = None;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let entry_name = entry.name().to_string();
        let extension = extension_of(&entry_name).unwrap_or_default();
        let target = path_with_extension(base_path, &extension);
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        debug!(entry = %entry_name, target = %target.display(), "extracted archive entry");
        if extension == ".shp" {
            shapefile = Some(target);
        }
    }

    drop(archive);
    fs::remove_file(payload_path)?;
    Ok(PayloadKind::Unpacked { shapefile })
}

/// Extension of `filename` including the leading dot, ignoring any directory
/// components.
fn extension_of(filename: &str) -> Option<String> {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    basename
        .rfind('.')
        .map(|dot| basename[dot..].to_string())
        .filter(|ext| ext.len() > 1)
}

fn path_with_extension(base: &Path, extension: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(extension);
    PathBuf::from(os)
}
