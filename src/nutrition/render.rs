//! Nutrition sheet rendering.
//!
//! Entries of the product's nutrition object are grouped into the four
//! [`Bucket`]s. Within a bucket rows keep the order the server sent them in.
//! Keys that belong to no bucket are not shown.

use std::fmt;

use serde_json::{Map, Value};

use super::catalog::{Bucket, NutrientCatalog};
use super::format::{derive_label, display_value, is_truthy, text_of};

/// Shown when the nutrition object has entries but none of them are known.
pub const NO_NUTRITION_DATA: &str = "No nutrition information available";

/// Shown when there is no nutrition object at all.
pub const NUTRITION_UNAVAILABLE: &str = "Nutrition information not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutritionRow {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutritionSection {
    pub bucket: Bucket,
    pub rows: Vec<NutritionRow>,
}

impl NutritionSection {
    pub fn heading(&self) -> Option<&'static str> {
        self.bucket.heading()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NutritionSheet {
    /// At least one row, grouped by bucket in display order.
    Sections(Vec<NutritionSection>),
    /// Nutrition data present but nothing displayable in it.
    NoData,
    /// No usable nutrition data.
    Unavailable,
}

impl NutritionSheet {
    pub fn rows(&self) -> impl Iterator<Item = &NutritionRow> {
        let sections: &[NutritionSection] = match self {
            NutritionSheet::Sections(sections) => sections,
            _ => &[],
        };
        sections.iter().flat_map(|s| s.rows.iter())
    }

    /// Find the row for a nutrient key.
    pub fn row(&self, key: &str) -> Option<&NutritionRow> {
        self.rows().find(|r| r.key == key)
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            NutritionSheet::Sections(_) => None,
            NutritionSheet::NoData => Some(NO_NUTRITION_DATA),
            NutritionSheet::Unavailable => Some(NUTRITION_UNAVAILABLE),
        }
    }
}

impl fmt::Display for NutritionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

impl fmt::Display for NutritionSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = match self {
            NutritionSheet::Sections(sections) => sections,
            other => return write!(f, "{}", other.placeholder().unwrap_or_default()),
        };
        let mut first = true;
        for section in sections {
            if let Some(heading) = section.heading() {
                if !first {
                    writeln!(f)?;
                }
                writeln!(f, "-- {} --", heading)?;
            }
            for row in &section.rows {
                writeln!(f, "{}", row)?;
            }
            first = false;
        }
        Ok(())
    }
}

/// Where row labels come from.
enum Labels<'a> {
    Catalog(&'a NutrientCatalog),
    /// Labels supplied with the product; they replace the catalog entirely.
    Product(Option<&'a Map<String, Value>>),
}

impl Labels<'_> {
    fn resolve(&self, key: &str) -> String {
        let found = match self {
            Labels::Catalog(catalog) => catalog.label(key).map(str::to_string),
            Labels::Product(map) => map
                .and_then(|m| m.get(key))
                .filter(|v| is_truthy(v))
                .map(text_of),
        };
        found.unwrap_or_else(|| derive_label(key))
    }
}

/// Build the nutrition sheet for a product.
///
/// `nutrition` is the product's raw nutrition value; `labels` its optional
/// `nutrition_labels`. Units always come from `catalog`.
pub fn render_nutrition(
    nutrition: Option<&Value>,
    labels: Option<&Value>,
    catalog: &NutrientCatalog,
) -> NutritionSheet {
    let labels = match labels {
        Some(value) if is_truthy(value) => Labels::Product(value.as_object()),
        _ => Labels::Catalog(catalog),
    };

    let entries: Vec<(&str, &Value)> = match nutrition {
        Some(Value::Object(map)) if !map.is_empty() => {
            map.iter().map(|(k, v)| (k.as_str(), v)).collect()
        }
        // A non-empty array has index keys, none of which are nutrients
        Some(Value::Array(items)) if !items.is_empty() => return NutritionSheet::NoData,
        _ => return NutritionSheet::Unavailable,
    };

    let sections: Vec<NutritionSection> = Bucket::ALL
        .into_iter()
        .filter_map(|bucket| {
            let rows: Vec<NutritionRow> = entries
                .iter()
                .filter(|(key, _)| bucket.contains(key))
                .map(|(key, value)| NutritionRow {
                    key: key.to_string(),
                    label: labels.resolve(key),
                    value: display_value(Some(*value), catalog.unit_or_default(key, bucket)),
                })
                .collect();
            (!rows.is_empty()).then_some(NutritionSection { bucket, rows })
        })
        .collect();

    if sections.is_empty() {
        NutritionSheet::NoData
    } else {
        NutritionSheet::Sections(sections)
    }
}
