// SPDX-License-Identifier: Apache-2.0

//! Thin HTTP transport shared by every remote fetch in a run.
//!
//! The fetcher only distinguishes "could not reach the endpoint" from "got a
//! response"; what any particular status code means is decided by the caller
//! that owns the policy.

use reqwest::StatusCode;
use reqwest::header::CONTENT_DISPOSITION;
use tracing::debug;

use crate::error::{ExtractError, Result};

/// Basic credentials forwarded to protected endpoints.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub username: String,
    pub password: String,
}

/// Outbound HTTP transport: one client, constructed once per run.
pub(crate) struct HttpFetcher {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

/// A fully-received HTTP response.
#[derive(Debug)]
pub(crate) struct FetchedResponse {
    pub status: StatusCode,
    /// Filename advertised by a `Content-Disposition` header, when present.
    pub filename_hint: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub(crate) fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body rendered as text for error reporting.
    pub(crate) fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl HttpFetcher {
    pub(crate) fn new(credentials: Option<Credentials>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    /// Issue a GET request, attaching `params` and the configured credentials.
    ///
    /// Responses of any status are returned to the caller; only failing to
    /// reach the endpoint at all maps to [`ExtractError::Connectivity`].
    pub(crate) async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<FetchedResponse> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        debug!(url, "sending GET request");
        let response = request
            .send()
            .await
            .map_err(|source| ExtractError::Connectivity {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let filename_hint = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_disposition_filename);
        let body = response.bytes().await?.to_vec();
        debug!(url, status = status.as_u16(), bytes = body.len(), "received response");

        Ok(FetchedResponse {
            status,
            filename_hint,
            body,
        })
    }
}

/// Pulls the `filename=` parameter out of a `Content-Disposition` value.
fn parse_disposition_filename(value: &str) -> Option<String> {
    value.split(';').find_map(|part| {
        let (key, name) = part.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = name.trim().trim_matches('"');
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_plain_disposition_filename() {
        assert_eq!(
            parse_disposition_filename("attachment; filename=rivers.zip"),
            Some("rivers.zip".to_string())
        );
    }

    #[test]
    fn parses_quoted_disposition_filename() {
        assert_eq!(
            parse_disposition_filename("attachment; filename=\"rivers rise.zip\""),
            Some("rivers rise.zip".to_string())
        );
    }

    #[test]
    fn ignores_dispositions_without_filename() {
        assert_eq!(parse_disposition_filename("inline"), None);
        assert_eq!(parse_disposition_filename("attachment; filename="), None);
    }

    #[tokio::test]
    async fn returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=rivers.zip")
                    .set_body_bytes(b"payload".to_vec()),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let response = fetcher
            .get(&format!("{}/payload", server.uri()), &[])
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.filename_hint.as_deref(), Some("rivers.zip"));
        assert_eq!(response.body, b"payload");
    }

    #[tokio::test]
    async fn sends_query_params_and_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api"))
            .and(query_param("q", "rivers"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Some(Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        }));
        let response = fetcher
            .get(&format!("{}/search/api", server.uri()), &[("q", "rivers")])
            .await
            .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn non_success_statuses_are_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None);
        let response = fetcher
            .get(&format!("{}/missing", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body_text(), "gone");
    }

    #[tokio::test]
    async fn unreachable_endpoints_map_to_connectivity() {
        let fetcher = HttpFetcher::new(None);
        let err = fetcher
            .get("http://127.0.0.1:1/search/api", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Connectivity { .. }));
    }
}
