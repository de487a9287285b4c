//! Barcode to product panel.
//!
//! Every entry point here ends in a [`Panel`]: either the rendered product
//! or a single terminal error message.

use std::path::Path;

use crate::api::{is_supported_language, ApiClient, ApiError};
use crate::camera::file_to_data_url;
use crate::display::{Panel, ProductView};
use crate::nutrition::NutrientCatalog;
use crate::scanner::{ScanError, ScanOutcome};

#[derive(Debug, Clone)]
pub struct Lookup {
    client: ApiClient,
    language: String,
    catalog: NutrientCatalog,
}

impl Lookup {
    /// Lookups in `language`. Unknown codes are still sent as-is.
    pub fn new(client: ApiClient, language: impl Into<String>) -> Self {
        let language = language.into();
        if !is_supported_language(&language) {
            log::warn!(
                "Language '{}' is not supported by the service, it will fall back to English",
                language
            );
        }
        Self {
            client,
            language,
            catalog: NutrientCatalog::STANDARD,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Fetch a product and build its view.
    pub async fn try_fetch_product(&self, barcode: &str) -> Result<ProductView, ApiError> {
        let product = self.client.fetch_product(barcode, &self.language).await?;
        Ok(ProductView::new(&product, barcode, &self.catalog))
    }

    pub async fn fetch_product(&self, barcode: &str) -> Panel {
        to_panel(self.try_fetch_product(barcode).await)
    }

    /// Decode a single image, then look up what it contains.
    ///
    /// Unlike polling, a failed decode here is final.
    pub async fn try_process_image(&self, image: &str) -> Result<ProductView, ApiError> {
        let response = self.client.scan_barcode(image).await?;
        let barcode = response.found().ok_or(ApiError::NoBarcode)?.to_string();
        log::info!("Decoded barcode {} from still image", barcode);
        self.try_fetch_product(&barcode).await
    }

    pub async fn process_image(&self, image: &str) -> Panel {
        to_panel(self.try_process_image(image).await)
    }

    /// Read an image file and run it through [`Lookup::process_image`].
    pub async fn process_file(&self, path: &Path) -> Panel {
        match file_to_data_url(path) {
            Ok(image) => self.process_image(&image).await,
            Err(e) => {
                log::error!("Could not read {}: {}", path.display(), e);
                Panel::error(e)
            }
        }
    }

    /// Look up a typed barcode. Blank input does nothing.
    pub async fn search(&self, input: &str) -> Option<Panel> {
        let barcode = input.trim();
        if barcode.is_empty() {
            return None;
        }
        Some(self.fetch_product(barcode).await)
    }

    /// Turn the end of a scanning run into a panel.
    pub async fn complete_scan(&self, outcome: Result<ScanOutcome, ScanError>) -> Panel {
        match outcome {
            Ok(ScanOutcome::Found(barcode)) => self.fetch_product(&barcode).await,
            Ok(ScanOutcome::Captured(image)) => self.process_image(&image).await,
            Ok(ScanOutcome::Cancelled) => Panel::Empty,
            Err(e) => Panel::error(e),
        }
    }
}

fn to_panel(result: Result<ProductView, ApiError>) -> Panel {
    match result {
        Ok(view) => Panel::Results(Box::new(view)),
        Err(e) => {
            log::error!("Lookup failed: {}", e);
            Panel::error(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraError;

    fn lookup() -> Lookup {
        Lookup::new(ApiClient::new("http://127.0.0.1:9").unwrap(), "en")
    }

    #[tokio::test]
    async fn test_blank_search_does_nothing() {
        assert_eq!(lookup().search("   ").await, None);
        assert_eq!(lookup().search("").await, None);
    }

    #[tokio::test]
    async fn test_cancelled_scan_leaves_panel_empty() {
        let panel = lookup().complete_scan(Ok(ScanOutcome::Cancelled)).await;
        assert_eq!(panel, Panel::Empty);
    }

    #[tokio::test]
    async fn test_camera_failure_is_terminal_error() {
        let outcome = Err(ScanError::CameraUnavailable(CameraError::PermissionDenied));
        let panel = lookup().complete_scan(outcome).await;
        assert_eq!(
            panel.to_string(),
            "Error: Unable to access camera. Please ensure camera permissions are granted."
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_error_panel() {
        let panel = lookup()
            .process_file(Path::new("/nonexistent/fooderator/label.png"))
            .await;
        assert!(matches!(panel, Panel::Error(_)));
    }

    #[test]
    fn test_unknown_language_is_kept() {
        let lookup = Lookup::new(ApiClient::new("http://localhost:5000").unwrap(), "xx");
        assert_eq!(lookup.language(), "xx");
    }
}
