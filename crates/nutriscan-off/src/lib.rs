#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/nutriscan/nutriscan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Open Food Facts product source.
//!
//! This crate provides an Open Food Facts provider that implements the
//! [`ProductSource`] trait from `nutriscan-core`.
//!
//! # Features
//!
//! - Quick and full lookups via the v2 product API with explicit field lists
//! - Legacy v0 lookup for recovering a missing Nutri-Score
//! - `Priority` request header on quick lookups
//! - Cancellation through a [`CancellationToken`]
//!
//! # Example
//!
//! ```no_run
//! use nutriscan_off::OpenFoodFactsProvider;
//! use nutriscan_core::{Barcode, CancellationToken, LookupKind, ProductSource};
//!
//! # async fn example() -> nutriscan_core::Result<()> {
//! let provider = OpenFoodFactsProvider::new();
//! let barcode = Barcode::new("3017620422003");
//! let cancel = CancellationToken::new();
//!
//! let product = provider.fetch_product(&barcode, LookupKind::Full, &cancel).await?;
//! println!("{:?}", product.product_name);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use nutriscan_core::{
    Barcode, CancellationToken, LookupKind, NutriError, Priority, ProductPayload, ProductSource,
    Result,
};
use reqwest::{StatusCode, Url, header};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Open Food Facts public instance.
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User agent for HTTP requests. Open Food Facts asks clients to identify themselves.
const DEFAULT_USER_AGENT: &str = concat!(
    "nutriscan/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/nutriscan/nutriscan)"
);

/// RFC 9218 priority header.
const PRIORITY_HEADER: &str = "priority";

const PROVIDER_NAME: &str = "Open Food Facts";

/// Open Food Facts product source.
///
/// Implements [`ProductSource`].
#[derive(Debug, Clone)]
pub struct OpenFoodFactsProvider {
    client: reqwest::Client,
    base_url: Url,
    user_agent: String,
    timeout: Duration,
}

impl OpenFoodFactsProvider {
    /// Create a new provider against the public instance with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a new provider with a custom HTTP client.
    ///
    /// The user agent and timeout are still applied per request.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: default_base_url(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the provider at another instance (a mirror, staging, or a test server).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| NutriError::InvalidParameter(format!("base URL {base_url}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(NutriError::InvalidParameter(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }
        self.base_url = url;
        Ok(self)
    }

    /// Set the user agent sent with every request.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The base URL lookups are made against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the lookup URL for a barcode.
    fn lookup_url(&self, barcode: &Barcode, kind: LookupKind) -> Result<Url> {
        let version = match kind {
            LookupKind::Quick | LookupKind::Full => "v2",
            LookupKind::Legacy => "v0",
        };

        let file = format!("{barcode}.json");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                NutriError::InvalidParameter(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", version, "product", file.as_str()]);

        if let Some(fields) = kind.fields() {
            url.query_pairs_mut().append_pair("fields", &fields.join(","));
        }

        Ok(url)
    }

    /// Send one lookup and decode the response envelope.
    async fn request(&self, barcode: &Barcode, kind: LookupKind, url: Url) -> Result<ProductPayload> {
        let mut request = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout);

        if kind.priority() == Priority::High {
            request = request.header(PRIORITY_HEADER, "u=1");
        }

        let response = request
            .send()
            .await
            .map_err(|e| NutriError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(NutriError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
                retry_after,
            });
        }

        // Unknown products come back as 404 with a `status: 0` body
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(NutriError::Network(format!("HTTP {status} for {barcode}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NutriError::Network(e.to_string()))?;

        match serde_json::from_slice::<ProductResponse>(&body) {
            Ok(envelope) => envelope.into_product(barcode),
            Err(_) if status == StatusCode::NOT_FOUND => {
                Err(NutriError::ProductNotFound(barcode.clone()))
            }
            Err(e) => Err(NutriError::Parse(e.to_string())),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

impl Default for OpenFoodFactsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_product(
        &self,
        barcode: &Barcode,
        kind: LookupKind,
        cancel: &CancellationToken,
    ) -> Result<ProductPayload> {
        if cancel.is_cancelled() {
            return Err(NutriError::Cancelled);
        }

        let url = self.lookup_url(barcode, kind)?;
        debug!(kind = kind.as_str(), %url, "Fetching product");

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(kind = kind.as_str(), barcode = %barcode, "Lookup aborted");
                Err(NutriError::Cancelled)
            }
            result = self.request(barcode, kind, url) => result,
        }
    }
}

// ============================================================================
// Open Food Facts API Response Types
// ============================================================================

/// Product API response envelope.
#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    product: Option<ProductPayload>,
}

impl ProductResponse {
    fn into_product(self, barcode: &Barcode) -> Result<ProductPayload> {
        let found = self.status.as_ref().and_then(Value::as_i64) == Some(1);
        match self.product {
            Some(product) if found => Ok(product),
            _ => Err(NutriError::ProductNotFound(barcode.clone())),
        }
    }
}
