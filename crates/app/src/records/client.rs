//! Record store HTTP client.

use std::{fmt, time::Duration};

use reqwest::{Client, Method, RequestBuilder, Response, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::records::{Query, RecordStoreError};

const PREFER_REPRESENTATION: &str = "return=representation";

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for connecting to the record store.
#[derive(Clone)]
pub struct RecordStoreConfig {
    /// Base URL, e.g. `"https://project.example.co"`.
    pub base_url: String,

    /// API key, sent both as `apikey` and as a bearer token.
    pub api_key: String,

    /// Whole-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for RecordStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for the record store's REST dialect.
#[derive(Debug, Clone)]
pub struct RecordStoreClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl RecordStoreClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL is not an http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(config: RecordStoreConfig) -> Result<Self, RecordStoreError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RecordStoreError::InvalidUrl(config.base_url));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(MAX_CONNECT_TIMEOUT))
            .build()
            .map_err(RecordStoreError::Client)?;

        Ok(Self {
            base_url,
            api_key: config.api_key,
            http,
        })
    }

    /// Read the rows of `table` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or a body that
    /// does not decode into `T`.
    #[tracing::instrument(name = "records.select", skip(self, query), err)]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, RecordStoreError> {
        let response = self
            .request(Method::GET, table)
            .query(query.params())
            .send()
            .await?;

        decode(table, response).await
    }

    /// Insert `body` (a row or an array of rows) into `table` and return the
    /// stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error on encoding or transport failure, a non-2xx status or
    /// a body that does not decode into `T`.
    #[tracing::instrument(name = "records.insert", skip(self, body), err)]
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>, RecordStoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", PREFER_REPRESENTATION)
            .header(CONTENT_TYPE, "application/json")
            .body(encode(body)?)
            .send()
            .await?;

        decode(table, response).await
    }

    /// Apply `changes` to the rows of `table` matching `query` and return the
    /// updated rows. Matching nothing is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error on encoding or transport failure, a non-2xx status or
    /// a body that does not decode into `T`.
    #[tracing::instrument(name = "records.update", skip(self, query, changes), err)]
    pub async fn update<B, T>(
        &self,
        table: &str,
        query: &Query,
        changes: &B,
    ) -> Result<Vec<T>, RecordStoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::PATCH, table)
            .query(query.params())
            .header("Prefer", PREFER_REPRESENTATION)
            .header(CONTENT_TYPE, "application/json")
            .body(encode(changes)?)
            .send()
            .await?;

        decode(table, response).await
    }

    /// Delete the rows of `table` matching `query` and return them.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or a body that
    /// does not decode into `T`.
    #[tracing::instrument(name = "records.delete", skip(self, query), err)]
    pub async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, RecordStoreError> {
        let response = self
            .request(Method::DELETE, table)
            .query(query.params())
            .header("Prefer", PREFER_REPRESENTATION)
            .send()
            .await?;

        decode(table, response).await
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, RecordStoreError> {
    serde_json::to_vec(body).map_err(RecordStoreError::Encode)
}

async fn decode<T: DeserializeOwned>(
    table: &str,
    response: Response,
) -> Result<Vec<T>, RecordStoreError> {
    let status = response.status();
    let body = response.text().await?;

    debug!(table, %status, bytes = body.len(), "record store response");

    if !status.is_success() {
        return Err(RecordStoreError::Status { status, body });
    }

    serde_json::from_str(&body).map_err(RecordStoreError::Decode)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
        name: String,
    }

    fn client(server: &MockServer) -> Result<RecordStoreClient, RecordStoreError> {
        RecordStoreClient::new(RecordStoreConfig {
            base_url: format!("{}/", server.uri()),
            api_key: "anon-key".to_string(),
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn select_sends_auth_headers_and_filters() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/categories"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(query_param("name", "eq.polos"))
            .and(query_param("order", "name.asc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "polos" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Row> = client(&server)?
            .select("categories", &Query::new().eq("name", "polos").order_asc("name"))
            .await?;

        assert_eq!(
            rows,
            vec![Row {
                id: 1,
                name: "polos".to_string()
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn insert_asks_for_the_stored_representation() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/categories"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({ "name": "gorras" })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{ "id": 7, "name": "gorras" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Row> = client(&server)?
            .insert("categories", &json!({ "name": "gorras" }))
            .await?;

        assert_eq!(rows.first().map(|row| row.id), Some(7));

        Ok(())
    }

    #[tokio::test]
    async fn update_patches_matching_rows() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.3"))
            .and(body_json(json!({ "views": 13 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Row> = client(&server)?
            .update("products", &Query::new().eq("id", 3), &json!({ "views": 13 }))
            .await?;

        assert!(rows.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/coupons"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let result: Result<Vec<Row>, _> = client(&server)?
            .delete("coupons", &Query::new().eq("code", "X"))
            .await;

        assert!(
            matches!(
                &result,
                Err(RecordStoreError::Status { status, body })
                    if status.as_u16() == 401 && body == "bad key"
            ),
            "expected a 401 status error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_decode_error() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "oops": true })))
            .mount(&server)
            .await;

        let result: Result<Vec<Row>, _> = client(&server)?
            .select("categories", &Query::new())
            .await;

        assert!(
            matches!(result, Err(RecordStoreError::Decode(_))),
            "expected a decode error, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = RecordStoreClient::new(RecordStoreConfig {
            base_url: "ftp://example.com".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(1),
        });

        assert!(
            matches!(result, Err(RecordStoreError::InvalidUrl(_))),
            "expected InvalidUrl, got {result:?}"
        );
    }
}
