//! Authenticated, tenant-scoped HTTP calls against the MDM API.
//!
//! Non-2xx responses are turned into [`GatewayError::Http`] only after the
//! response body has been read, so the remote diagnostic text survives.

use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use domain::GatewayError;
use shared::TenantCrn;

use crate::config::MdmClientConfig;

/// Headers checked, in order, for a cross-system correlation id.
const TRANSACTION_ID_HEADERS: [&str; 4] = [
    "x-transaction-id",
    "x-global-transaction-id",
    "x-correlation-id",
    "x-request-id",
];

const ACCEPT_JSON: &str = "application/json";
const ACCEPT_OCTET_STREAM: &str = "application/octet-stream";

/// Shared HTTP plumbing for the MDM API.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    config: MdmClientConfig,
}

impl Transport {
    pub fn new(config: MdmClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &MdmClientConfig {
        &self.config
    }

    /// Absolute URL of an API path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `GET` a JSON document. Retried on transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        crn: &TenantCrn,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .send(
                || self.request(Method::GET, path, crn, query, ACCEPT_JSON),
                &Method::GET,
                path,
                self.config.max_retries,
            )
            .await?;
        decode_json(response).await
    }

    /// `POST` a JSON body. Issued exactly once; never retried.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        crn: &TenantCrn,
        body: &B,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .send(
                || {
                    self.request(Method::POST, path, crn, query, ACCEPT_JSON)
                        .json(body)
                },
                &Method::POST,
                path,
                0,
            )
            .await?;
        decode_json(response).await
    }

    /// Start a streaming binary `GET`. The caller reads the body in chunks.
    ///
    /// Retried on transient failures up to the point the response headers
    /// arrive; a stream broken mid-transfer is not resumed.
    pub async fn open_download(
        &self,
        path: &str,
        crn: &TenantCrn,
        query: &[(&str, String)],
    ) -> Result<Response, GatewayError> {
        self.send(
            || {
                self.request(Method::GET, path, crn, query, ACCEPT_OCTET_STREAM)
                    .timeout(self.config.download_timeout())
            },
            &Method::GET,
            path,
            self.config.max_retries,
        )
        .await
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        crn: &TenantCrn,
        query: &[(&str, String)],
        accept: &str,
    ) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT, accept)
            .query(&[("crn", crn.as_str())])
            .query(query);

        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn send<F>(
        &self,
        build: F,
        method: &Method,
        path: &str,
        max_retries: u32,
    ) -> Result<Response, GatewayError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                tokio::time::sleep(self.config.backoff(attempt)).await;
            }

            let err = match build().send().await {
                Ok(response) => {
                    log_transaction_id(response.headers(), method, path);
                    if response.status().is_success() {
                        debug!(method = %method, path = %path, status = %response.status(), "MDM API call succeeded");
                        return Ok(response);
                    }
                    http_error(response).await
                }
                Err(e) => GatewayError::Network(e.to_string()),
            };

            if attempt < max_retries && err.is_transient() {
                attempt += 1;
                warn!(
                    method = %method,
                    path = %path,
                    attempt = attempt,
                    error = %err,
                    "Transient MDM API failure, retrying"
                );
                continue;
            }

            error!(method = %method, path = %path, error = %err, "MDM API call failed");
            return Err(err);
        }
    }
}

/// Build the error for a non-2xx response, reading the body first.
async fn http_error(response: Response) -> GatewayError {
    let status = response.status();
    let url = response.url().to_string();
    let body = match response.text().await {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Could not read MDM error response body");
            None
        }
    };

    if let Some(body) = &body {
        error!(status = status.as_u16(), response_body = %body, "MDM API error response");
    }

    GatewayError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
        url,
        body,
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// First correlation id present in the response headers.
pub fn transaction_id(headers: &HeaderMap) -> Option<&str> {
    TRANSACTION_ID_HEADERS
        .iter()
        .find_map(|name| headers.get(*name).and_then(|value| value.to_str().ok()))
}

fn log_transaction_id(headers: &HeaderMap, method: &Method, path: &str) {
    if let Some(id) = transaction_id(headers) {
        info!(method = %method, path = %path, transaction_id = %id, "MDM API transaction");
    }
}
