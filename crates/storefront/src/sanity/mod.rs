//! Content store client (Sanity-compatible HTTP API).
//!
//! # Architecture
//!
//! - The store is source of truth for products, orders, and user profiles -
//!   NO local database, direct API calls only
//! - Reads go through the query endpoint with raw GROQ strings and typed
//!   `serde` response envelopes
//! - Writes go through the mutation endpoint; a patch touches a single
//!   document atomically
//! - Product reads are cached in-memory via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use libaas_storefront::sanity::SanityClient;
//!
//! let store = SanityClient::new(&config.sanity);
//!
//! // Look up a customer's document id by identity-provider subject
//! let customer = store.find_user_ref(&subject).await?;
//!
//! // Cancel an order with a single-field patch
//! store.set_order_status(&order_id, OrderStatus::Cancelled).await?;
//! ```

mod orders;
mod products;
mod users;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::SanityConfig;
use crate::models::Product;

/// How long cached product reads stay fresh.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("content store rejected the request ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Body excerpt from the store's error response.
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Envelope around every query response.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Cached product data. Boxed/shared so cache hits clone cheaply.
#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    ProductList(Arc<Vec<Product>>),
}

/// Client for the content store's HTTP API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct SanityClient {
    inner: Arc<SanityClientInner>,
}

struct SanityClientInner {
    http: reqwest::Client,
    query_endpoint: String,
    mutate_endpoint: String,
    token: String,
    products: Cache<String, CacheValue>,
}

impl SanityClient {
    /// Create a new content store client.
    #[must_use]
    pub fn new(config: &SanityConfig) -> Self {
        let base = format!(
            "https://{}.api.sanity.io/v{}/data",
            config.project_id, config.api_version
        );

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(SanityClientInner {
                http: reqwest::Client::new(),
                query_endpoint: format!("{base}/query/{}", config.dataset),
                mutate_endpoint: format!("{base}/mutate/{}", config.dataset),
                token: config.api_token.expose_secret().to_string(),
                products,
            }),
        }
    }

    /// Execute a GROQ query and deserialize the `result` field.
    ///
    /// Parameters are passed as `$name` query-string entries with
    /// JSON-encoded values, per the store's query API.
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, serde_json::Value)],
    ) -> Result<T, StoreError> {
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(params.len() + 1);
        pairs.push(("query".to_owned(), groq.to_owned()));
        for (name, value) in params {
            pairs.push((format!("${name}"), value.to_string()));
        }

        let response = self
            .inner
            .http
            .get(&self.inner.query_endpoint)
            .query(&pairs)
            .bearer_auth(&self.inner.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %message.chars().take(500).collect::<String>(),
                "content store query failed"
            );
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let envelope: QueryResponse<T> = response.json().await?;
        Ok(envelope.result)
    }

    /// Submit a mutation batch.
    ///
    /// The store applies mutations per-document atomically, which is the only
    /// write-concurrency guarantee this service relies on.
    pub(crate) async fn mutate(&self, mutations: serde_json::Value) -> Result<(), StoreError> {
        let body = serde_json::json!({ "mutations": mutations });

        let response = self
            .inner
            .http
            .post(&self.inner.mutate_endpoint)
            .bearer_auth(&self.inner.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %message.chars().take(500).collect::<String>(),
                "content store mutation failed"
            );
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        Ok(())
    }

    /// Cheap connectivity check for the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the request.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.query::<i64>("1", &[]).await.map(|_| ())
    }

    fn product_cache(&self) -> &Cache<String, CacheValue> {
        &self.inner.products
    }
}
