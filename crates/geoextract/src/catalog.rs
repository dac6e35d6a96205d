// SPDX-License-Identifier: Apache-2.0

//! Client for the catalog's search endpoint: paginated layer listing plus
//! single-layer resolution by name.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{ExtractError, Result};
use crate::fetch::HttpFetcher;
use crate::models::layer::{LayerDescriptor, SearchPage, strip_namespace};

/// Fixed relative path of the catalog's search endpoint.
const SEARCH_ENDPOINT: &str = "search/api";

/// Retrieve the full, ordered list of layers matching `query`.
///
/// Follows `next` cursors until the catalog stops returning one, or until a
/// page contributes zero new items. An empty page counts as end-of-stream
/// even when a cursor is still present, so a misbehaving server cannot loop
/// the client forever.
pub(crate) async fn list_layers(
    fetcher: &HttpFetcher,
    base_url: &str,
    query: Option<&str>,
) -> Result<Vec<LayerDescriptor>> {
    let url = search_url(base_url);
    let mut params: Vec<(&str, &str)> = Vec::new();
    if let Some(q) = query {
        params.push(("q", q));
    }

    let first = fetch_page(fetcher, &url, &params).await?;
    if let Some(total) = first.total {
        info!(total, "catalog reported layer count");
    }

    let mut layers = first.results;
    let mut cursor = first.next;
    while let Some(next) = cursor {
        let page_url = resolve_cursor(base_url, &next);
        let page = fetch_page(fetcher, &page_url, &[]).await?;
        if page.results.is_empty() {
            debug!(url = %page_url, "page contributed no new layers, stopping pagination");
            break;
        }
        layers.extend(page.results);
        cursor = page.next;
    }

    Ok(layers)
}

/// Collapse the ordered layer list into a name-keyed index. Later entries
/// overwrite earlier ones with the same name; callers that need the catalog's
/// ordering must use [`list_layers`] instead.
pub(crate) async fn layer_index(
    fetcher: &HttpFetcher,
    base_url: &str,
    query: Option<&str>,
) -> Result<HashMap<String, LayerDescriptor>> {
    let layers = list_layers(fetcher, base_url, query).await?;
    Ok(layers
        .into_iter()
        .map(|layer| (layer.name.clone(), layer))
        .collect())
}

/// Resolve a single layer by name, searching with its stripped form.
///
/// The search is free-text, so results are narrowed to exact name matches
/// before counting. Counting happens on the deduplicated index, and no match
/// and more than one match are distinct failures.
pub(crate) async fn find_layer(
    fetcher: &HttpFetcher,
    base_url: &str,
    name: &str,
) -> Result<LayerDescriptor> {
    let bare = strip_namespace(name);
    let candidates = layer_index(fetcher, base_url, Some(bare)).await?;
    let mut exact: Vec<LayerDescriptor> = candidates
        .into_values()
        .filter(|layer| layer.stripped_name() == bare)
        .collect();
    match exact.len() {
        0 => Err(ExtractError::Structural(format!(
            "there is no layer named \"{bare}\" in the catalog"
        ))),
        1 => Ok(exact.remove(0)),
        n => Err(ExtractError::Structural(format!(
            "{n} layers in the catalog are named \"{bare}\", refusing to pick one"
        ))),
    }
}

fn search_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), SEARCH_ENDPOINT)
}

/// Pagination cursors may be absolute URLs or paths relative to the base.
fn resolve_cursor(base_url: &str, cursor: &str) -> String {
    if cursor.starts_with("http://") || cursor.starts_with("https://") {
        cursor.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            cursor.trim_start_matches('/')
        )
    }
}

async fn fetch_page(fetcher: &HttpFetcher, url: &str, params: &[(&str, &str)]) -> Result<SearchPage> {
    let response = fetcher.get(url, params).await?;
    if !response.is_success() {
        return Err(ExtractError::Upstream {
            url: url.to_string(),
            status: response.status.as_u16(),
            body: response.body_text(),
        });
    }
    let page: SearchPage = serde_json::from_slice(&response.body)?;
    if page.success == Some(false) {
        return Err(ExtractError::Catalog(page.errors.join(",")));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(name: &str) -> serde_json::Value {
        json!({"name": name, "title": name, "links": {
            "zip": {"url": format!("http://example.org/{name}.zip"), "extension": ".zip"}
        }})
    }

    #[tokio::test]
    async fn lists_a_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "results": [entry("geonode:rivers"), entry("geonode:lakes")]
            })))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let layers = list_layers(&fetcher, &server.uri(), None).await.unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "geonode:rivers");
    }

    #[tokio::test]
    async fn forwards_the_query_term() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .and(query_param("q", "rivers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "results": [entry("geonode:rivers")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let layers = list_layers(&fetcher, &server.uri(), Some("rivers"))
            .await
            .unwrap();
        assert_eq!(layers.len(), 1);
    }

    #[tokio::test]
    async fn reports_remote_errors_as_catalog_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "errors": ["index offline", "try later"]
            })))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let err = list_layers(&fetcher, &server.uri(), None).await.unwrap_err();
        match err {
            ExtractError::Catalog(message) => {
                assert!(message.contains("index offline"));
                assert!(message.contains("try later"));
            }
            other => panic!("expected Catalog error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stops_pagination_on_an_empty_page_despite_a_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 4,
                "results": [entry("a"), entry("b")],
                "next": format!("{}/search/page2", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": [entry("c"), entry("d")],
                "next": "search/page3"
            })))
            .expect(1)
            .mount(&server)
            .await;
        // page three keeps advertising a cursor but has nothing new
        Mock::given(method("GET"))
            .and(path("/search/page3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": [],
                "next": "search/page3"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let layers = list_layers(&fetcher, &server.uri(), None).await.unwrap();
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn index_deduplicates_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3,
                "results": [
                    entry("geonode:rivers"),
                    entry("geonode:lakes"),
                    {"name": "geonode:rivers", "title": "Rivers v2", "links": {}}
                ]
            })))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let index = layer_index(&fetcher, &server.uri(), None).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["geonode:rivers"].title, "Rivers v2");
    }

    #[tokio::test]
    async fn find_layer_requires_exactly_one_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .and(query_param("q", "rivers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "results": [entry("geonode:rivers"), entry("other:rivers")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .and(query_param("q", "glaciers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 0,
                "results": []
            })))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);

        let err = find_layer(&fetcher, &server.uri(), "geonode:rivers")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refusing to pick one"));

        let err = find_layer(&fetcher, &server.uri(), "glaciers")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no layer named"));
    }
}
