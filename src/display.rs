//! Product presentation.
//!
//! [`ProductView`] resolves every optional product field to something
//! printable; [`Panel`] is what the result area currently shows.

use std::fmt;

use crate::api::Product;
use crate::nutrition::{render_nutrition, NutrientCatalog, NutritionSheet};

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const UNKNOWN_BRAND: &str = "N/A";
pub const DEFAULT_PRODUCT_IMAGE: &str = "default-product.png";

/// Value the service uses when it has no ingredient list.
pub const INGREDIENTS_SENTINEL: &str = "Ingredients not available in database";

pub const INGREDIENTS_FALLBACK: &str =
    "Ingredients not available in database. The product information may be incomplete.";

/// A product with all display fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductView {
    pub name: String,
    pub brand: String,
    pub barcode: String,
    pub image_url: String,
    pub ingredients: String,
    pub allergens: Option<String>,
    pub categories: Option<String>,
    pub data_source: Option<String>,
    pub translated_to: Option<String>,
    pub nutrition: NutritionSheet,
}

impl ProductView {
    /// Build the view for `product`, which was looked up as `barcode`.
    pub fn new(product: &Product, barcode: &str, catalog: &NutrientCatalog) -> Self {
        let ingredients = product
            .ingredients
            .as_deref()
            .filter(|i| !i.is_empty() && *i != INGREDIENTS_SENTINEL)
            .unwrap_or(INGREDIENTS_FALLBACK)
            .to_string();

        Self {
            name: non_empty(&product.name).unwrap_or(UNKNOWN_PRODUCT).to_string(),
            brand: non_empty(&product.brand).unwrap_or(UNKNOWN_BRAND).to_string(),
            barcode: non_empty(&product.barcode).unwrap_or(barcode).to_string(),
            image_url: non_empty(&product.image_url)
                .unwrap_or(DEFAULT_PRODUCT_IMAGE)
                .to_string(),
            ingredients,
            allergens: non_empty(&product.allergens).map(str::to_string),
            categories: non_empty(&product.categories).map(str::to_string),
            data_source: non_empty(&product.data_source).map(str::to_string),
            translated_to: non_empty(&product.translated_to).map(str::to_string),
            nutrition: render_nutrition(
                product.nutrition.as_ref(),
                product.nutrition_labels.as_ref(),
                catalog,
            ),
        }
    }

    pub fn ingredients_available(&self) -> bool {
        self.ingredients != INGREDIENTS_FALLBACK
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl fmt::Display for ProductView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "Brand: {}", self.brand)?;
        writeln!(f, "Barcode: {}", self.barcode)?;
        writeln!(f, "Image: {}", self.image_url)?;
        writeln!(f)?;
        writeln!(f, "Ingredients")?;
        writeln!(f, "{}", self.ingredients)?;
        if let Some(allergens) = &self.allergens {
            writeln!(f, "Allergens: {}", allergens)?;
        }
        if let Some(categories) = &self.categories {
            writeln!(f, "Categories: {}", categories)?;
        }
        writeln!(f)?;
        writeln!(f, "Nutrition")?;
        match self.nutrition {
            NutritionSheet::Sections(_) => write!(f, "{}", self.nutrition)?,
            _ => writeln!(f, "{}", self.nutrition)?,
        }
        match (&self.data_source, &self.translated_to) {
            (Some(source), Some(lang)) => write!(f, "\nSource: {} (translated to {})\n", source, lang),
            (Some(source), None) => write!(f, "\nSource: {}\n", source),
            (None, Some(lang)) => write!(f, "\nTranslated to {}\n", lang),
            (None, None) => Ok(()),
        }
    }
}

/// What the result area shows. Exactly one of these at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Empty,
    Loading,
    Results(Box<ProductView>),
    Error(String),
}

impl Panel {
    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading)
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Panel::Error(message.to_string())
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::Empty => Ok(()),
            Panel::Loading => write!(f, "Loading..."),
            Panel::Results(view) => write!(f, "{}", view),
            Panel::Error(message) => write!(f, "Error: {}", message),
        }
    }
}
