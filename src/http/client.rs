//! Backend client with built-in retry and error classification.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::base_url::{join_url, resolve_base_url};
use super::error::{ApiError, Failure};
use super::retry::{RequestOptions, RequestPolicy, with_retry};

/// Origin relative base URLs are served from.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Process-wide client settings. Read-only once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Raw base URL override, validated by [`resolve_base_url`].
    pub base_url: Option<String>,
    /// Origin used to anchor a relative base URL.
    pub origin: String,
    pub defaults: RequestPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            origin: DEFAULT_ORIGIN.to_string(),
            defaults: RequestPolicy::default(),
        }
    }
}

/// HTTP client for the wallet backend.
///
/// Every verb goes through the retry loop and fails only with [`ApiError`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    defaults: RequestPolicy,
}

impl ApiClient {
    /// Builds a client from configuration, resolving the base URL once.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let resolved = resolve_base_url(config.base_url.as_deref());
        let base_url = if resolved.starts_with('/') {
            join_url(&config.origin, &resolved)
        } else {
            resolved
        };

        let client = Client::builder()
            .user_agent(concat!("wallet-cli/", env!("WALLET_CLI_VERSION")))
            .timeout(config.defaults.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        debug!("Using API base URL {}", base_url);
        Ok(Self::with_client(client, base_url, config.defaults))
    }

    /// Wraps an existing reqwest client; `base_url` is used verbatim.
    pub fn with_client(client: Client, base_url: impl Into<String>, defaults: RequestPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            defaults,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn defaults(&self) -> &RequestPolicy {
        &self.defaults
    }

    #[tracing::instrument(skip(self, options))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, None, options).await
    }

    #[tracing::instrument(skip(self, body, options))]
    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.send(Method::POST, path, body, options).await
    }

    #[tracing::instrument(skip(self, body, options))]
    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.send(Method::PUT, path, body, options).await
    }

    #[tracing::instrument(skip(self, options))]
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::DELETE, path, None, options).await
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let policy = options.policy(&self.defaults);
        let url = join_url(&self.base_url, path);
        let operation_name = format!("{} {}", method, path);

        debug!("{} {} (policy {:?})...", method, url, policy);

        with_retry(&operation_name, &policy, || {
            self.send_once::<T, B>(method.clone(), &url, body, options, &policy)
        })
        .await
    }

    /// Single attempt without retry.
    async fn send_once<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        options: &RequestOptions,
        policy: &RequestPolicy,
    ) -> Result<T, Failure>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let mut request = self
            .client
            .request(method, url)
            .timeout(policy.timeout)
            .headers(options.headers.clone());

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            return Err(Failure::status(status.as_u16(), body));
        }

        decode(&bytes)
    }
}

/// Decodes a success body; an empty body reads as JSON `null`.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Failure> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::deserialize(Value::Null)?);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorCode;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn fast_policy() -> RequestPolicy {
        RequestPolicy {
            retries: 3,
            retry_delay: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        }
    }

    fn client_for(server: &mockito::Server) -> ApiClient {
        ApiClient::with_client(Client::new(), server.url(), fast_policy())
    }

    #[tokio::test]
    async fn test_get_listing_passes_through() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "data": [
                {"id": "t1", "walletId": "w1", "amount": 10, "balance": 110, "description": "a", "date": "2024-01-01T00:00:00Z", "type": "CREDIT"},
                {"id": "t2", "walletId": "w1", "amount": -5, "balance": 105, "description": "b", "date": "2024-01-02T00:00:00Z", "type": "DEBIT"}
            ],
            "pagination": {"skip": 0, "limit": 10, "count": 2}
        });

        let mock = server
            .mock("GET", "/transaction?walletId=w1&limit=10")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let result: Value = client
            .get("/transaction?walletId=w1&limit=10", &RequestOptions::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, body);
        assert_eq!(result["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_with_query_options() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/wallet")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("q".into(), "a b".into()),
            ]))
            .with_status(200)
            .with_body("[1, 2]")
            .create_async()
            .await;

        let client = client_for(&server);
        let result: Vec<u32> = client
            .get("/wallet", &RequestOptions::new().query("page", 1).query("q", "a b"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/wallet/setup")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "Home", "balance": 20.5})))
            .with_status(201)
            .with_body(r#"{"id": "w1"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result: Value = client
            .post(
                "/wallet/setup",
                Some(&json!({"name": "Home", "balance": 20.5})),
                &RequestOptions::new(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["id"], "w1");
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/wallet/w1")
            .match_body(Matcher::Json(json!({"name": "Renamed"})))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/wallet/w1")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let updated: Value = client
            .put("/wallet/w1", Some(&json!({"name": "Renamed"})), &RequestOptions::new())
            .await
            .unwrap();
        let deleted: Option<Value> = client
            .delete("/wallet/w1", &RequestOptions::new())
            .await
            .unwrap();

        put.assert_async().await;
        delete.assert_async().await;
        assert_eq!(updated["ok"], true);
        assert_eq!(deleted, None);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/wallet/missing")
            .with_status(404)
            .with_body(r#"{"message": "Wallet not found"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .get::<Value>("/wallet/missing", &RequestOptions::new().retries(5))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.code(), ErrorCode::ClientError);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "Wallet not found");
        assert!(!err.retryable());
    }

    #[test_log::test(tokio::test)]
    async fn test_server_error_retries_then_succeeds() {
        let mut server = mockito::Server::new_async().await;
        // The first matching mock with hits left wins, so the 503s go first.
        let unavailable = server
            .mock("GET", "/wallet/w1")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/wallet/w1")
            .with_status(200)
            .with_body(r#"{"id": "w1"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let result: Value = client
            .get("/wallet/w1", &RequestOptions::new())
            .await
            .unwrap();

        unavailable.assert_async().await;
        ok.assert_async().await;
        assert_eq!(result["id"], "w1");
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/transaction/w1")
            .with_status(500)
            .with_body(r#"{"message": "database unavailable"}"#)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .post::<Value, _>(
                "/transaction/w1",
                Some(&json!({"amount": 1, "description": "x"})),
                &RequestOptions::new().retries(2),
            )
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.code(), ErrorCode::ServerError);
        assert_eq!(err.message(), "database unavailable");
        assert!(err.retryable());
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/wallet/w1")
            .with_status(200)
            .with_body("<html>not json</html>")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .get::<Value>("/wallet/w1", &RequestOptions::new())
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.code(), ErrorCode::ParseError);
        assert_eq!(err.message(), "Failed to parse response");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = ApiClient::with_client(
            Client::new(),
            "http://127.0.0.1:1",
            RequestPolicy {
                retries: 1,
                retry_delay: Duration::from_millis(1),
                timeout: Duration::from_secs(2),
            },
        );

        let err = client
            .get::<Value>("/wallet/w1", &RequestOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::NetworkError);
        assert!(err.retryable());
    }

    #[tokio::test]
    async fn test_unresponsive_backend_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = ApiClient::with_client(
            Client::new(),
            format!("http://{}", addr),
            RequestPolicy {
                retries: 0,
                retry_delay: Duration::from_millis(1),
                timeout: Duration::from_millis(100),
            },
        );

        let err = client
            .get::<Value>("/wallet/w1", &RequestOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Timeout);
        assert!(err.retryable());
        assert_eq!(err.status(), None);
        assert_eq!(err.message(), "Request timeout. Please try again.");
    }

    #[test]
    fn test_new_anchors_relative_base_on_origin() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api/v1");
    }

    #[test]
    fn test_new_rejects_foreign_host() {
        let config = ClientConfig {
            base_url: Some("https://attacker.example/api".to_string()),
            origin: "http://localhost:5173".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5173/api/v1");
    }

    #[test]
    fn test_new_accepts_allowed_host() {
        let config = ClientConfig {
            base_url: Some("http://127.0.0.1:4000/api/".to_string()),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:4000/api");
    }

    #[test]
    fn test_decode_empty_body() {
        let value: Option<Value> = decode(b"").unwrap();
        assert_eq!(value, None);
        assert!(decode::<Vec<u8>>(b"  ").is_err());
    }
}
