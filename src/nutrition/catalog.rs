//! Static nutrient tables: display labels, units and the four display buckets.

/// One of the four fixed groups nutrients are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Macronutrients,
    Vitamins,
    Minerals,
    Other,
}

impl Bucket {
    /// Display order.
    pub const ALL: [Bucket; 4] = [
        Bucket::Macronutrients,
        Bucket::Vitamins,
        Bucket::Minerals,
        Bucket::Other,
    ];

    /// Section heading. Macronutrients lead the sheet and get none.
    pub fn heading(self) -> Option<&'static str> {
        match self {
            Bucket::Macronutrients => None,
            Bucket::Vitamins => Some("Vitamins"),
            Bucket::Minerals => Some("Minerals"),
            Bucket::Other => Some("Other"),
        }
    }

    /// Unit used when the catalog has none for a key.
    pub fn default_unit(self) -> &'static str {
        match self {
            Bucket::Macronutrients | Bucket::Other => "g",
            Bucket::Vitamins | Bucket::Minerals => "mg",
        }
    }

    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Bucket::Macronutrients => MACRONUTRIENTS,
            Bucket::Vitamins => VITAMINS,
            Bucket::Minerals => MINERALS,
            Bucket::Other => OTHERS,
        }
    }

    pub fn contains(self, key: &str) -> bool {
        self.keys().contains(&key)
    }

    /// The bucket a nutrient key belongs to; unknown keys have none.
    pub fn of(key: &str) -> Option<Bucket> {
        Self::ALL.into_iter().find(|bucket| bucket.contains(key))
    }
}

const MACRONUTRIENTS: &[&str] = &[
    "energy",
    "energy_kj",
    "fat",
    "saturated_fat",
    "monounsaturated_fat",
    "polyunsaturated_fat",
    "trans_fat",
    "cholesterol",
    "carbohydrates",
    "fiber",
    "sugars",
    "added_sugars",
    "proteins",
    "salt",
    "sodium",
];

const VITAMINS: &[&str] = &[
    "vitamin_a",
    "vitamin_a_iu",
    "vitamin_c",
    "vitamin_d",
    "vitamin_e",
    "vitamin_k",
    "vitamin_b1",
    "vitamin_b2",
    "niacin",
    "vitamin_b6",
    "folate",
    "vitamin_b12",
    "pantothenic_acid",
    "biotin",
];

const MINERALS: &[&str] = &[
    "potassium",
    "calcium",
    "iron",
    "magnesium",
    "phosphorus",
    "zinc",
    "copper",
    "manganese",
    "selenium",
    "iodine",
];

const OTHERS: &[&str] = &["caffeine", "alcohol"];

const LABELS: &[(&str, &str)] = &[
    ("energy", "Calories"),
    ("energy_kj", "Energy (kJ)"),
    ("fat", "Total Fat"),
    ("saturated_fat", "Saturated Fat"),
    ("monounsaturated_fat", "Monounsaturated Fat"),
    ("polyunsaturated_fat", "Polyunsaturated Fat"),
    ("trans_fat", "Trans Fat"),
    ("cholesterol", "Cholesterol"),
    ("carbohydrates", "Total Carbohydrates"),
    ("sugars", "Sugars"),
    ("added_sugars", "Added Sugars"),
    ("fiber", "Dietary Fiber"),
    ("proteins", "Protein"),
    ("salt", "Salt"),
    ("sodium", "Sodium"),
    ("potassium", "Potassium"),
    ("calcium", "Calcium"),
    ("iron", "Iron"),
    ("magnesium", "Magnesium"),
    ("phosphorus", "Phosphorus"),
    ("zinc", "Zinc"),
    ("copper", "Copper"),
    ("manganese", "Manganese"),
    ("selenium", "Selenium"),
    ("iodine", "Iodine"),
    ("vitamin_a", "Vitamin A"),
    ("vitamin_a_iu", "Vitamin A (IU)"),
    ("vitamin_c", "Vitamin C"),
    ("vitamin_d", "Vitamin D"),
    ("vitamin_e", "Vitamin E"),
    ("vitamin_k", "Vitamin K"),
    ("vitamin_b1", "Thiamin (B1)"),
    ("vitamin_b2", "Riboflavin (B2)"),
    ("niacin", "Niacin (B3)"),
    ("vitamin_b6", "Vitamin B6"),
    ("folate", "Folate"),
    ("vitamin_b12", "Vitamin B12"),
    ("pantothenic_acid", "Pantothenic Acid"),
    ("biotin", "Biotin"),
    ("caffeine", "Caffeine"),
    ("alcohol", "Alcohol"),
];

const UNITS: &[(&str, &str)] = &[
    ("energy", "kcal"),
    ("energy_kj", "kJ"),
    ("cholesterol", "mg"),
    ("sodium", "mg"),
    ("potassium", "mg"),
    ("calcium", "mg"),
    ("iron", "mg"),
    ("magnesium", "mg"),
    ("phosphorus", "mg"),
    ("zinc", "mg"),
    ("copper", "mg"),
    ("manganese", "mg"),
    ("selenium", "μg"),
    ("iodine", "μg"),
    ("vitamin_a", "μg"),
    ("vitamin_a_iu", "IU"),
    ("vitamin_c", "mg"),
    ("vitamin_d", "μg"),
    ("vitamin_e", "mg"),
    ("vitamin_k", "μg"),
    ("vitamin_b1", "mg"),
    ("vitamin_b2", "mg"),
    ("niacin", "mg"),
    ("vitamin_b6", "mg"),
    ("folate", "μg"),
    ("vitamin_b12", "μg"),
    ("pantothenic_acid", "mg"),
    ("biotin", "μg"),
    ("caffeine", "mg"),
    ("alcohol", "g"),
];

/// Label and unit lookup for known nutrient keys.
#[derive(Debug, Clone, Copy)]
pub struct NutrientCatalog {
    labels: &'static [(&'static str, &'static str)],
    units: &'static [(&'static str, &'static str)],
}

impl NutrientCatalog {
    /// The built-in tables.
    pub const STANDARD: NutrientCatalog = NutrientCatalog {
        labels: LABELS,
        units: UNITS,
    };

    pub fn label(&self, key: &str) -> Option<&'static str> {
        lookup(self.labels, key)
    }

    pub fn unit(&self, key: &str) -> Option<&'static str> {
        lookup(self.units, key)
    }

    /// Catalog unit, or the bucket's default.
    pub fn unit_or_default(&self, key: &str, bucket: Bucket) -> &'static str {
        self.unit(key).unwrap_or_else(|| bucket.default_unit())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for NutrientCatalog {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_disjoint() {
        for bucket in Bucket::ALL {
            for key in bucket.keys() {
                let owners: Vec<_> = Bucket::ALL.iter().filter(|b| b.contains(key)).collect();
                assert_eq!(owners.len(), 1, "{} is in {:?}", key, owners);
            }
        }
    }

    #[test]
    fn test_every_bucketed_key_has_a_label() {
        let catalog = NutrientCatalog::STANDARD;
        for bucket in Bucket::ALL {
            for key in bucket.keys() {
                assert!(catalog.label(key).is_some(), "missing label for {}", key);
            }
        }
        let bucketed: usize = Bucket::ALL.iter().map(|b| b.keys().len()).sum();
        assert_eq!(bucketed, catalog.len());
    }

    #[test]
    fn test_bucket_of() {
        assert_eq!(Bucket::of("energy"), Some(Bucket::Macronutrients));
        assert_eq!(Bucket::of("niacin"), Some(Bucket::Vitamins));
        assert_eq!(Bucket::of("iodine"), Some(Bucket::Minerals));
        assert_eq!(Bucket::of("caffeine"), Some(Bucket::Other));
        assert_eq!(Bucket::of("glitter"), None);
    }

    #[test]
    fn test_units_fall_back_per_bucket() {
        let catalog = NutrientCatalog::STANDARD;
        assert_eq!(catalog.unit_or_default("energy", Bucket::Macronutrients), "kcal");
        assert_eq!(catalog.unit_or_default("fat", Bucket::Macronutrients), "g");
        assert_eq!(catalog.unit_or_default("selenium", Bucket::Minerals), "μg");
        assert_eq!(catalog.unit_or_default("unlisted", Bucket::Vitamins), "mg");
        assert_eq!(catalog.unit_or_default("unlisted", Bucket::Other), "g");
    }

    #[test]
    fn test_headings() {
        assert_eq!(Bucket::Macronutrients.heading(), None);
        assert_eq!(Bucket::Other.heading(), Some("Other"));
    }
}
