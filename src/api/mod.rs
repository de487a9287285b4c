//! HTTP client for the product lookup service.
//!
//! Three endpoints are used: `POST /api/scan-barcode` to decode an image,
//! `GET /api/product/{barcode}?lang={code}` to look a product up, and
//! `GET /api/languages` to list translation targets.

mod client;
mod types;

pub use client::{ApiClient, ApiError, DEFAULT_BASE_URL, SCAN_BARCODE_PATH};
pub use types::{
    is_supported_language, Product, ScanRequest, ScanResponse, SUPPORTED_LANGUAGES,
};
