//! HTTP transport for the Kayako REST API.
//!
//! This module provides `RestClient`, the [`Transport`] used in production.
//!
//! # Request format
//!
//! Every call targets `{base}index.php?{controller}/{params}` (or
//! `index.php?e={controller}/...` with [`UrlStyle::EParameter`]) and is
//! signed with a random salt: `signature = base64(HMAC-SHA256(secret, salt))`.
//! `apikey`, `salt` and `signature` travel in the query string for GET and
//! DELETE and in the form body for POST and PUT.
//!
//! # Retry Logic
//!
//! GET requests are retried on transient failures:
//! - HTTP 429 (rate limit): Exponential backoff starting at 100ms
//! - HTTP 502/503/504: Retry after 500ms
//! - Timeouts: Retry after 100ms
//!
//! POST, PUT and DELETE are never retried.
//!
//! # Security
//!
//! Keys are never logged. All error messages are sanitized before logging.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use reqwest::{multipart, Client, Method, StatusCode};
use sha2::Sha256;

use crate::config::Config;
use crate::error::{KayakoError, Result};
use crate::transport::{FilePart, RequestData, Transport, WireData};
use crate::xml;

type HmacSha256 = Hmac<Sha256>;

/// Maximum number of attempts for a GET request.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Initial delay for exponential backoff (milliseconds).
const INITIAL_BACKOFF_MS: u64 = 100;

/// Delay before retrying after server error (milliseconds).
const SERVER_ERROR_DELAY_MS: u64 = 500;

/// Maximum length for HTTP error response bodies.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Controller used to check connectivity.
const CONNECTION_TEST_CONTROLLER: &str = "/Base/StaffGroup";

/// HTTP client for the Kayako REST API.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let rest = RestClient::new(config)?;
/// rest.test_connection().await?;
/// ```
#[derive(Clone)]
pub struct RestClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL, API key, secret key and URL style.
    /// SECURITY: Never log the keys!
    config: Config,
}

impl RestClient {
    /// Creates a new REST client from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration containing base URL and keys
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(KayakoError::HttpClient)?;

        Ok(Self { http, config })
    }

    fn secrets(&self) -> [&str; 2] {
        [&self.config.api_key, &self.config.secret_key]
    }

    fn sanitize(&self, message: &str) -> String {
        KayakoError::sanitize_message(message, &self.secrets())
    }

    /// Builds the request URL for a controller and positional parameters.
    #[must_use]
    pub fn endpoint_url(&self, controller: &str, params: &[String]) -> String {
        let mut route = controller.to_string();
        for param in params {
            route.push('/');
            route.push_str(&urlencoding::encode(param));
        }
        format!(
            "{}index.php?{}{}",
            self.config.base_url,
            self.config.url_style.query_prefix(),
            route
        )
    }

    /// Computes the request signature for a salt.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Config` if the secret key cannot key the MAC.
    pub fn signature(&self, salt: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.secret_key.as_bytes())
            .map_err(|_| KayakoError::invalid_config("secret key cannot be used for signing"))?;
        mac.update(salt.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Fresh `apikey`, `salt` and `signature` pairs.
    fn auth_pairs(&self) -> Result<Vec<(String, String)>> {
        let salt = rand::thread_rng().gen_range(100_000_000u64..10_000_000_000u64).to_string();
        let signature = self.signature(&salt)?;
        Ok(vec![
            ("apikey".to_string(), self.config.api_key.clone()),
            ("salt".to_string(), salt),
            ("signature".to_string(), signature),
        ])
    }

    /// Tests the connection by listing staff groups.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::ConnectionTest` if the connection fails,
    /// with details about the failure reason.
    pub async fn test_connection(&self) -> Result<()> {
        tracing::debug!("Testing connection to Kayako server");

        match self.get(CONNECTION_TEST_CONTROLLER, &[]).await {
            Ok(_) => {
                tracing::info!("Connection test successful");
                Ok(())
            }
            Err(KayakoError::Authentication) => Err(KayakoError::connection_test(
                "Authentication failed - verify KAYAKO_API_KEY and KAYAKO_SECRET_KEY are correct",
            )),
            Err(KayakoError::Timeout { duration, .. }) => {
                Err(KayakoError::connection_test(format!(
                    "Connection timed out after {:?} - verify KAYAKO_BASE_URL is correct and server is reachable",
                    duration
                )))
            }
            Err(KayakoError::Http(e)) => Err(KayakoError::connection_test(format!(
                "HTTP error: {} - verify KAYAKO_BASE_URL is correct",
                self.sanitize(&e.to_string())
            ))),
            Err(e) => Err(KayakoError::connection_test(self.sanitize(&e.to_string()))),
        }
    }

    /// Executes an operation with retry logic for transient failures.
    async fn with_retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempts < MAX_RETRY_ATTEMPTS => {
                    let actual_delay = if e.is_rate_limit() {
                        e.retry_after().unwrap_or(delay)
                    } else if matches!(e, KayakoError::ServiceUnavailable { .. }) {
                        Duration::from_millis(SERVER_ERROR_DELAY_MS)
                    } else {
                        delay
                    };

                    tracing::debug!(
                        operation = operation,
                        attempt = attempts,
                        max_attempts = MAX_RETRY_ATTEMPTS,
                        delay_ms = actual_delay.as_millis() as u64,
                        error = %e.sanitized_display(&self.secrets()),
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(actual_delay).await;

                    if e.is_rate_limit() {
                        delay *= 2;
                    }
                }
                Err(e) => {
                    if attempts > 1 {
                        tracing::debug!(
                            operation = operation,
                            attempts = attempts,
                            "All retry attempts exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Sends one request and returns the raw response body.
    ///
    /// This is the low-level request method without retry logic.
    async fn request_inner(
        &self,
        method: Method,
        controller: &str,
        params: &[String],
        fields: Option<&RequestData>,
        files: &[FilePart],
    ) -> Result<String> {
        let url = self.endpoint_url(controller, params);

        tracing::debug!(
            method = %method,
            controller = %controller,
            params = params.len(),
            fields = fields.map_or(0, RequestData::len),
            files = files.len(),
            "Making Kayako API request"
        );

        let auth = self.auth_pairs()?;
        let mut req = self.http.request(method.clone(), &url);

        match fields {
            None => {
                req = req.query(&auth);
            }
            Some(fields) if !files.is_empty() => {
                let mut form = multipart::Form::new();
                for (name, value) in fields.to_form_pairs().into_iter().chain(auth) {
                    form = form.text(name, value);
                }
                for file in files {
                    let part = multipart::Part::bytes(file.contents.clone())
                        .file_name(file.file_name.clone());
                    form = form.part(file.field.clone(), part);
                }
                req = req.multipart(form);
            }
            Some(fields) => {
                let mut pairs = fields.to_form_pairs();
                pairs.extend(auth);
                req = req.form(&pairs);
            }
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                return KayakoError::timeout(self.config.timeout, format!("{} {}", method, controller));
            }
            KayakoError::Http(e)
        })?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.handle_http_error(status, response, controller, params).await);
        }

        let body = response.text().await.map_err(KayakoError::Http)?;
        tracing::trace!(body = %self.sanitize(&body), "Kayako API response");
        Ok(body)
    }

    /// Handles HTTP-level errors and converts to `KayakoError`.
    async fn handle_http_error(
        &self,
        status: StatusCode,
        response: reqwest::Response,
        controller: &str,
        params: &[String],
    ) -> KayakoError {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.unwrap_or_default();
        let body = self.sanitize(&body);
        let body = if body.len() > MAX_ERROR_BODY_LEN {
            let cut = (0..=MAX_ERROR_BODY_LEN)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}...[truncated]", &body[..cut])
        } else {
            body
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => KayakoError::Authentication,
            StatusCode::NOT_FOUND => KayakoError::not_found(controller, params),
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Rate limited by Kayako server");
                KayakoError::RateLimited { retry_after }
            }
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => {
                tracing::warn!(status = %status, "Kayako server temporarily unavailable");
                KayakoError::ServiceUnavailable { status }
            }
            _ => KayakoError::HttpStatus { status, body },
        }
    }
}

#[async_trait]
impl Transport for RestClient {
    async fn get(&self, controller: &str, params: &[String]) -> Result<WireData> {
        let operation = format!("GET {}", controller);
        let body = self
            .with_retry(&operation, || {
                self.request_inner(Method::GET, controller, params, None, &[])
            })
            .await?;
        xml::decode(&body)
    }

    async fn post(
        &self,
        controller: &str,
        params: &[String],
        fields: &RequestData,
        files: &[FilePart],
    ) -> Result<WireData> {
        let body = self
            .request_inner(Method::POST, controller, params, Some(fields), files)
            .await?;
        xml::decode(&body)
    }

    async fn put(
        &self,
        controller: &str,
        params: &[String],
        fields: &RequestData,
    ) -> Result<WireData> {
        let body = self
            .request_inner(Method::PUT, controller, params, Some(fields), &[])
            .await?;
        xml::decode(&body)
    }

    async fn delete(&self, controller: &str, params: &[String]) -> Result<()> {
        self.request_inner(Method::DELETE, controller, params, None, &[])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UrlStyle;

    fn test_client(style: UrlStyle) -> RestClient {
        let config = Config::new("https://help.example.com/api/index.php", "key-1", "secret-1")
            .unwrap()
            .with_url_style(style);
        RestClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_url_standard() {
        let client = test_client(UrlStyle::Standard);
        assert_eq!(
            client.endpoint_url("/Tickets/TicketNote", &["12".to_string(), "7".to_string()]),
            "https://help.example.com/api/index.php?/Tickets/TicketNote/12/7"
        );
    }

    #[test]
    fn test_endpoint_url_e_parameter() {
        let client = test_client(UrlStyle::EParameter);
        assert_eq!(
            client.endpoint_url("/Base/StaffGroup", &[]),
            "https://help.example.com/api/index.php?e=/Base/StaffGroup"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_params() {
        let client = test_client(UrlStyle::Standard);
        assert_eq!(
            client.endpoint_url("/Tickets/Ticket", &["a b&c".to_string()]),
            "https://help.example.com/api/index.php?/Tickets/Ticket/a%20b%26c"
        );
    }

    #[test]
    fn test_signature_is_deterministic_per_salt() {
        let client = test_client(UrlStyle::Standard);
        let first = client.signature("123456789").unwrap();
        assert_eq!(first, client.signature("123456789").unwrap());
        assert_ne!(first, client.signature("987654321").unwrap());
        assert!(base64::engine::general_purpose::STANDARD.decode(&first).is_ok());
    }

    #[test]
    fn test_auth_pairs_carry_key_not_secret() {
        let client = test_client(UrlStyle::Standard);
        let pairs = client.auth_pairs().unwrap();
        assert_eq!(pairs[0], ("apikey".to_string(), "key-1".to_string()));
        assert!(pairs.iter().all(|(_, v)| v != "secret-1"));
    }
}
