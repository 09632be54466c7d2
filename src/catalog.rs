use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

const BUILTIN_PRODUCTS: &str = include_str!("../data/products.json");

/// Shown when neither the record nor its category has an image.
pub const DEFAULT_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1567591370504-80c5c6a77d95?w=600&h=600&fit=crop&q=80";

/// Product categories offered by the workshop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Ganesh,
    RadhaKrishna,
    Temple,
    Jain,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Ganesh,
        Category::RadhaKrishna,
        Category::Temple,
        Category::Jain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ganesh => "ganesh",
            Category::RadhaKrishna => "radha-krishna",
            Category::Temple => "temple",
            Category::Jain => "jain",
        }
    }

    /// Human-readable label used on cards and in the modal
    pub fn label(&self) -> &'static str {
        match self {
            Category::Ganesh => "Ganesh Ji",
            Category::RadhaKrishna => "Radha Krishna",
            Category::Temple => "Temple Work",
            Category::Jain => "Jain Murti",
        }
    }

    /// Remote stand-in image for this category
    pub fn placeholder(&self) -> &'static str {
        match self {
            Category::RadhaKrishna => {
                "https://images.unsplash.com/photo-1604608672516-f1b9b1d37076?w=600&h=600&fit=crop&q=80"
            }
            Category::Ganesh => {
                "https://images.unsplash.com/photo-1567591370504-80c5c6a77d95?w=600&h=600&fit=crop&q=80"
            }
            Category::Temple => {
                "https://images.unsplash.com/photo-1548013146-72479768bada?w=600&h=600&fit=crop&q=80"
            }
            Category::Jain => {
                "https://images.unsplash.com/photo-1609619385002-f40f1df9b7eb?w=600&h=600&fit=crop&q=80"
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Invalid category: {}", s))
    }
}

/// Which slice of the catalog the grid shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Only(Category),
    /// A filter value naming no known category; it matches nothing
    Unknown(String),
}

impl Filter {
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            return Filter::All;
        }
        match value.parse::<Category>() {
            Ok(category) => Filter::Only(category),
            Err(_) => Filter::Unknown(value.to_string()),
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => *wanted == category,
            Filter::Unknown(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Filter::All => "all",
            Filter::Only(category) => category.as_str(),
            Filter::Unknown(value) => value,
        }
    }
}

/// A validated catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: u32,
    pub name: String,
    pub name_hindi: String,
    pub category: Category,
    /// Relative to the asset root; may be blank
    pub image: String,
    pub description: String,
    pub description_hindi: String,
    /// Free-form display string, e.g. "Contact for Price"
    pub price: String,
    pub alt: String,
}

/// Shape of a row in the product table before validation
#[derive(Debug, Default, Deserialize)]
pub struct RawProduct {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub name_hindi: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub description_hindi: Option<String>,
    pub price: Option<String>,
    pub alt: Option<String>,
}

impl RawProduct {
    /// Check required fields and category membership.
    ///
    /// Returns the reason for rejection so the caller can log it.
    pub fn validate(self) -> Result<ProductRecord, String> {
        let id = self.id.ok_or("Product missing field: id")?;
        if id == 0 {
            return Err("Product id must be positive".to_string());
        }
        let name = self
            .name
            .ok_or_else(|| format!("Product {} missing field: name", id))?;
        let category = self
            .category
            .ok_or_else(|| format!("Product {} missing field: category", id))?;
        let image = self
            .image
            .ok_or_else(|| format!("Product {} missing field: image", id))?;
        let description = self
            .description
            .ok_or_else(|| format!("Product {} missing field: description", id))?;
        let price = self
            .price
            .ok_or_else(|| format!("Product {} missing field: price", id))?;
        let category = category.parse::<Category>()?;

        Ok(ProductRecord {
            id,
            alt: self
                .alt
                .filter(|alt| !alt.is_empty())
                .unwrap_or_else(|| name.clone()),
            name,
            name_hindi: self.name_hindi.unwrap_or_default(),
            category,
            image,
            description,
            description_hindi: self.description_hindi.unwrap_or_default(),
            price,
        })
    }
}

/// The fixed, ordered product list
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<ProductRecord>,
}

impl Catalog {
    /// The compiled-in catalog.
    ///
    /// A broken embedded table is logged and yields an empty catalog, so the
    /// page still loads.
    pub fn builtin() -> Self {
        match Catalog::from_json(BUILTIN_PRODUCTS) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("Built-in product table unusable: {}", e);
                Catalog::default()
            }
        }
    }

    /// Parse a product table, dropping invalid rows
    ///
    /// # Errors
    /// * `CatalogError::Malformed` if the text is not a JSON array of objects
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<RawProduct> = serde_json::from_str(json)?;
        Ok(Catalog::from_raw(raw))
    }

    pub fn from_raw(raw: Vec<RawProduct>) -> Self {
        let mut seen = HashSet::new();
        let products = raw
            .into_iter()
            .filter_map(|row| match row.validate() {
                Ok(record) if seen.insert(record.id) => Some(record),
                Ok(record) => {
                    warn!("Duplicate product id: {}", record.id);
                    None
                }
                Err(reason) => {
                    warn!("{}", reason);
                    None
                }
            })
            .collect();
        Catalog { products }
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Records matching `filter`, in catalog order
    pub fn filtered<'a>(
        &'a self,
        filter: &'a Filter,
    ) -> impl Iterator<Item = &'a ProductRecord> + 'a {
        self.products
            .iter()
            .filter(move |p| filter.matches(p.category))
    }
}

/// Image for a record: its own path, else the category stand-in, else the
/// generic default.
pub fn resolve_image(product: Option<&ProductRecord>) -> &str {
    match product {
        None => DEFAULT_PLACEHOLDER,
        Some(p) if !p.image.trim().is_empty() => &p.image,
        Some(p) => p.category.placeholder(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: u32, category: &str) -> RawProduct {
        RawProduct {
            id: Some(id),
            name: Some(format!("Murti {}", id)),
            category: Some(category.to_string()),
            image: Some(format!("images/products/{}.jpeg", id)),
            description: Some("Hand painted".to_string()),
            price: Some("Contact for Price".to_string()),
            ..RawProduct::default()
        }
    }

    #[test]
    fn builtin_catalog_has_five_products_in_order() {
        let catalog = Catalog::builtin();
        let ids: Vec<u32> = catalog.products().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(catalog.get(3).unwrap().category, Category::Ganesh);
        assert_eq!(catalog.get(1).unwrap().name_hindi, "राधा कृष्ण संगमरमर मूर्ति");
    }

    #[test]
    fn record_missing_price_is_dropped() {
        let mut no_price = raw(2, "ganesh");
        no_price.price = None;
        let catalog = Catalog::from_raw(vec![raw(1, "jain"), no_price, raw(3, "temple")]);
        let ids: Vec<u32> = catalog.products().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn unknown_category_and_duplicate_ids_are_dropped() {
        let catalog = Catalog::from_raw(vec![
            raw(1, "ganesh"),
            raw(2, "shiva"),
            raw(1, "jain"),
            raw(0, "jain"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.products()[0].category, Category::Ganesh);
    }

    #[test]
    fn alt_defaults_to_name() {
        let record = raw(7, "temple").validate().unwrap();
        assert_eq!(record.alt, "Murti 7");
    }

    #[test]
    fn malformed_table_is_an_error() {
        assert!(Catalog::from_json("{\"id\": 1}").is_err());
    }

    #[test]
    fn resolve_image_falls_back_by_category() {
        let mut record = raw(1, "jain").validate().unwrap();
        assert_eq!(resolve_image(Some(&record)), "images/products/1.jpeg");

        record.image = "   ".to_string();
        assert_eq!(resolve_image(Some(&record)), Category::Jain.placeholder());
        assert_eq!(resolve_image(None), DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn filters_preserve_order() {
        let catalog = Catalog::builtin();
        let all = Filter::parse("all");
        let ganesh = Filter::parse("ganesh");
        let bogus = Filter::parse("shiva");

        assert_eq!(catalog.filtered(&all).count(), 5);
        let ids: Vec<u32> = catalog.filtered(&ganesh).map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(catalog.filtered(&bogus).count(), 0);
        assert_eq!(bogus.as_str(), "shiva");
    }

    #[test]
    fn category_labels() {
        assert_eq!(Category::RadhaKrishna.label(), "Radha Krishna");
        assert_eq!(Category::Temple.label(), "Temple Work");
        assert_eq!("radha-krishna".parse::<Category>(), Ok(Category::RadhaKrishna));
    }
}
