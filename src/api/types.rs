//! Wire types for the scan and product endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Languages the product service can translate into.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("zh-cn", "Chinese (Simplified)"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("ru", "Russian"),
];

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Request body for `POST /api/scan-barcode`.
#[derive(Debug, Serialize)]
pub struct ScanRequest<'a> {
    /// Image as a data URL.
    pub image: &'a str,
}

/// Response from `POST /api/scan-barcode`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ScanResponse {
    #[serde(default)]
    pub barcode: Option<String>,
    /// Symbology reported by the decoder (EAN13, CODE128, ...).
    #[serde(default, rename = "type")]
    pub symbology: Option<String>,
}

impl ScanResponse {
    /// The decoded barcode, if the frame contained one.
    pub fn found(&self) -> Option<&str> {
        self.barcode.as_deref().filter(|b| !b.is_empty())
    }
}

/// Product as returned by `GET /api/product/{barcode}`.
///
/// Every field is optional; display code supplies the fallbacks.
/// `nutrition` is kept as raw JSON so key order and value types survive
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub nutrition: Option<Value>,
    #[serde(default)]
    pub nutrition_labels: Option<Value>,
    #[serde(default)]
    pub allergens: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub translated_to: Option<String>,
}
