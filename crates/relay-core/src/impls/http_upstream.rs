//! HttpUpstream - 上流 REST API の UpstreamSource 実装（reqwest）
//!
//! `GET {base}/{collection}?updated_since=..&per_page=..&page=..` を Basic 認証
//! （API key + ダミーパスワード）で 1 回発行する。
//! レスポンスのリストは top-level 配列か、いくつかのキーの下にネストされている。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamCredentials;
use crate::domain::RelayError;
use crate::domain::timestamp::canonical;
use crate::ports::{PageRequest, UpstreamSource};

/// Keys tried after the collection name itself, in order.
const LIST_KEYS: &[&str] = &["results", "data", "items", "records"];

pub struct HttpUpstream {
    client: reqwest::Client,
    base_url_template: String,
    collection: String,
    credentials: Option<UpstreamCredentials>,
}

impl HttpUpstream {
    /// `base_url_template` may contain `{subdomain}`.
    pub fn new(
        base_url_template: impl Into<String>,
        collection: impl Into<String>,
        credentials: Option<UpstreamCredentials>,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("building upstream http client: {e}")))?;
        Ok(Self {
            client,
            base_url_template: base_url_template.into(),
            collection: collection.into(),
            credentials,
        })
    }

    fn list_url(&self, credentials: &UpstreamCredentials) -> String {
        let base = self
            .base_url_template
            .replace("{subdomain}", &credentials.subdomain);
        format!("{}/{}", base.trim_end_matches('/'), self.collection)
    }
}

#[async_trait]
impl UpstreamSource for HttpUpstream {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Value>, RelayError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            RelayError::Config("upstream subdomain and api key must both be set".into())
        })?;
        let url = self.list_url(credentials);
        debug!(%url, page = request.page, since = %canonical(&request.since), "polling upstream");

        let response = self
            .client
            .get(&url)
            .basic_auth(&credentials.api_key, Some("X"))
            .query(&[
                ("updated_since", canonical(&request.since)),
                ("per_page", request.per_page.to_string()),
                ("page", request.page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream(format!(
                "GET {url} returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RelayError::MalformedResponse(format!("decoding body: {e}")))?;
        extract_records(body, &self.collection)
    }
}

/// Pull the record list out of a response body.
///
/// Accepts a top-level array, or an object holding an array under the
/// collection name or one of [`LIST_KEYS`].
pub fn extract_records(body: Value, collection: &str) -> Result<Vec<Value>, RelayError> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => {
            for key in std::iter::once(collection).chain(LIST_KEYS.iter().copied()) {
                match map.remove(key) {
                    Some(Value::Array(records)) => return Ok(records),
                    Some(Value::Null) | None => continue,
                    Some(other) => {
                        return Err(RelayError::MalformedResponse(format!(
                            "`{key}` is not a list but {}",
                            type_name(&other)
                        )));
                    }
                }
            }
            Err(RelayError::MalformedResponse(
                "object has no recognised list key".into(),
            ))
        }
        other => Err(RelayError::MalformedResponse(format!(
            "expected a list or object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PageRequest {
        PageRequest {
            since: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
            page: 1,
            per_page: 100,
        }
    }

    fn credentials() -> Option<UpstreamCredentials> {
        Some(UpstreamCredentials {
            subdomain: "acme".into(),
            api_key: "secret".into(),
        })
    }

    #[rstest]
    #[case(json!([{"id": 1}, {"id": 2}]))]
    #[case(json!({"tickets": [{"id": 1}, {"id": 2}]}))]
    #[case(json!({"results": [{"id": 1}, {"id": 2}], "total": 2}))]
    #[case(json!({"data": [{"id": 1}, {"id": 2}]}))]
    #[case(json!({"tickets": null, "items": [{"id": 1}, {"id": 2}]}))]
    fn extracts_list_from_known_shapes(#[case] body: Value) {
        let records = extract_records(body, "tickets").unwrap();
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn empty_list_is_not_an_error() {
        assert!(extract_records(json!({"tickets": []}), "tickets").unwrap().is_empty());
    }

    #[rstest]
    #[case(json!("nope"))]
    #[case(json!({"total": 0}))]
    #[case(json!({"tickets": {"id": 1}}))]
    fn rejects_unrecognised_shapes(#[case] body: Value) {
        let err = extract_records(body, "tickets").unwrap_err();
        assert!(matches!(err, RelayError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn sends_filter_and_page_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/tickets"))
            .and(query_param("updated_since", "2024-02-01T09:00:00Z"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(
            format!("{}/api/v2", server.uri()),
            "tickets",
            credentials(),
            Duration::from_secs(5),
        )
        .unwrap();

        let records = upstream.fetch_page(&request()).await.unwrap();
        assert_eq!(records, vec![json!({"id": 7})]);
    }

    #[tokio::test]
    async fn auth_rejection_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let upstream =
            HttpUpstream::new(server.uri(), "tickets", credentials(), Duration::from_secs(5))
                .unwrap();

        let err = upstream.fetch_page(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let upstream =
            HttpUpstream::new(server.uri(), "tickets", None, Duration::from_secs(5)).unwrap();

        let err = upstream.fetch_page(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn subdomain_is_substituted_into_base_url() {
        let upstream = HttpUpstream::new(
            "https://{subdomain}.freshdesk.com/api/v2/",
            "tickets",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        let creds = UpstreamCredentials {
            subdomain: "acme".into(),
            api_key: "k".into(),
        };
        assert_eq!(
            upstream.list_url(&creds),
            "https://acme.freshdesk.com/api/v2/tickets"
        );
    }
}
