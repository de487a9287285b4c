//! ApiClient - handles communication with the product lookup service.

use std::collections::BTreeMap;
use std::time::Duration;

use super::types::{Product, ScanRequest, ScanResponse};

/// Default base URL of the lookup service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Path of the barcode decode endpoint.
pub const SCAN_BARCODE_PATH: &str = "/api/scan-barcode";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the scan, product and language endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url` with the default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::MissingBaseUrl);
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scan_url(&self) -> String {
        format!("{}{}", self.base_url, SCAN_BARCODE_PATH)
    }

    /// Product URL, templated literally with barcode and language.
    pub fn product_url(&self, barcode: &str, lang: &str) -> String {
        format!("{}/api/product/{}?lang={}", self.base_url, barcode, lang)
    }

    pub fn languages_url(&self) -> String {
        format!("{}/api/languages", self.base_url)
    }

    /// Submit an image (as a data URL) to the barcode decoder.
    ///
    /// A 2xx response without a barcode is not an error: the image simply
    /// had nothing readable in it. Use [`ScanResponse::found`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ScanFailed` for a non-2xx response, or
    /// `ApiError::HttpError` if the request fails.
    pub async fn scan_barcode(&self, image: &str) -> Result<ScanResponse, ApiError> {
        let response = self
            .http_client
            .post(self.scan_url())
            .header("Content-Type", "application/json")
            .json(&ScanRequest { image })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::debug!("scan-barcode returned {}: {}", status, body);
            return Err(ApiError::ScanFailed {
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch product details for a barcode in the given language.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ProductNotFound` for any non-2xx response, or
    /// `ApiError::HttpError` if the request or body decoding fails.
    pub async fn fetch_product(&self, barcode: &str, lang: &str) -> Result<Product, ApiError> {
        let url = self.product_url(barcode, lang);
        log::info!("Fetching product {}", url);

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Product lookup for {} failed with status {}", barcode, status);
            return Err(ApiError::ProductNotFound {
                barcode: barcode.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch the service's language table (code -> display name).
    pub async fn languages(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let response = self.http_client.get(self.languages_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::ApiError(format!(
                "Language list failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }
}

/// Errors talking to the lookup service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Server URL not configured")]
    MissingBaseUrl,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to scan barcode")]
    ScanFailed {
        /// HTTP status returned by the decoder
        status: u16,
    },

    #[error("No barcode found in image")]
    NoBarcode,

    #[error("Product not found")]
    ProductNotFound {
        /// Barcode that was looked up
        barcode: String,
        /// HTTP status returned by the service
        status: u16,
    },

    #[error("API error: {0}")]
    ApiError(String),
}
