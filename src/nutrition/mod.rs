//! Nutrition facts presentation.
//!
//! Known nutrient keys are listed in a static [`NutrientCatalog`] and split
//! into four [`Bucket`]s. [`render_nutrition`] turns a product's raw
//! nutrition object into a [`NutritionSheet`].

mod catalog;
mod format;
mod render;

pub use catalog::{Bucket, NutrientCatalog};
pub use format::{derive_label, display_value, format_number, to_fixed_2, NOT_AVAILABLE};
pub use render::{
    render_nutrition, NutritionRow, NutritionSection, NutritionSheet, NO_NUTRITION_DATA,
    NUTRITION_UNAVAILABLE,
};
