//! Catalog records walked by the fetcher and mapped into feed rows.
//!
//! Records are plain data. Anything that needs store context (URLs, labels,
//! currency) is resolved by a domain helper in the engine crate.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a catalog entity. Unique and non-negative, not necessarily contiguous.
pub type EntityId = u64;

/// The domain shape of a record. Maps declare the shape they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    Product,
    Category,
}

impl RecordShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordShape::Product => "product",
            RecordShape::Category => "category",
        }
    }
}

impl fmt::Display for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock state of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    /// Units on hand. Fractional quantities are allowed by some catalogs.
    #[serde(default)]
    pub qty: f64,
    #[serde(default)]
    pub is_in_stock: bool,
}

/// A sellable catalog product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub entity_id: EntityId,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    /// URL key used to build the canonical product URL.
    #[serde(default)]
    pub url_key: Option<String>,
    /// Final price in the store currency. `None` when no price is indexed.
    #[serde(default)]
    pub price: Option<f64>,
    /// Media path of the base image, relative to the store media URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<EntityId>,
    /// Store codes the product is assigned to. Empty means every store.
    #[serde(default)]
    pub store_codes: Vec<String>,
    #[serde(default)]
    pub stock: Option<StockInfo>,
    /// Free-form attribute bag: option ids for select attributes and raw values for the rest.
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
}

/// A catalog category node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub entity_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    /// Depth in the tree. Levels 0 and 1 are the tree root and the store root category.
    #[serde(default)]
    pub level: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub include_in_menu: bool,
    #[serde(default)]
    pub store_codes: Vec<String>,
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
}

const fn default_true() -> bool {
    true
}

/// Any record a record source can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogRecord {
    Product(ProductRecord),
    Category(CategoryRecord),
}

impl CatalogRecord {
    pub fn entity_id(&self) -> EntityId {
        match self {
            CatalogRecord::Product(product) => product.entity_id,
            CatalogRecord::Category(category) => category.entity_id,
        }
    }

    pub fn shape(&self) -> RecordShape {
        match self {
            CatalogRecord::Product(_) => RecordShape::Product,
            CatalogRecord::Category(_) => RecordShape::Category,
        }
    }

    pub fn as_product(&self) -> Option<&ProductRecord> {
        match self {
            CatalogRecord::Product(product) => Some(product),
            CatalogRecord::Category(_) => None,
        }
    }

    /// Whether the record is visible in the given store.
    ///
    /// Records without store assignments belong to every store.
    pub fn in_store(&self, store_code: &str) -> bool {
        let store_codes = match self {
            CatalogRecord::Product(product) => &product.store_codes,
            CatalogRecord::Category(category) => &category.store_codes,
        };
        store_codes.is_empty() || store_codes.iter().any(|code| code == store_code)
    }

    /// Generic property lookup by name.
    ///
    /// Named struct properties win over the attribute bag. Returns `None` when
    /// neither knows the property.
    pub fn property(&self, name: &str) -> Option<Value> {
        match self {
            CatalogRecord::Product(product) => product_property(product, name),
            CatalogRecord::Category(category) => category_property(category, name),
        }
    }
}

fn product_property(product: &ProductRecord, name: &str) -> Option<Value> {
    let value = match name {
        "entity_id" => Value::from(product.entity_id),
        "sku" => Value::from(product.sku.as_str()),
        "name" => Value::from(product.name.as_str()),
        "url_key" => Value::from(product.url_key.clone()?),
        "image" => Value::from(product.image.clone()?),
        _ => return product.attributes.get(name).filter(|value| !value.is_null()).cloned(),
    };
    Some(value)
}

fn category_property(category: &CategoryRecord, name: &str) -> Option<Value> {
    let value = match name {
        "entity_id" => Value::from(category.entity_id),
        "name" => Value::from(category.name.as_str()),
        "parent_id" => Value::from(category.parent_id?),
        "level" => Value::from(category.level),
        _ => return category.attributes.get(name).filter(|value| !value.is_null()).cloned(),
    };
    Some(value)
}

impl From<ProductRecord> for CatalogRecord {
    fn from(product: ProductRecord) -> Self {
        CatalogRecord::Product(product)
    }
}

impl From<CategoryRecord> for CatalogRecord {
    fn from(category: CategoryRecord) -> Self {
        CatalogRecord::Category(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shirt() -> ProductRecord {
        ProductRecord {
            entity_id: 7,
            sku: "SHIRT-7".into(),
            name: "Linen shirt".into(),
            url_key: Some("linen-shirt".into()),
            attributes: IndexMap::from([("description".to_string(), json!("Breathable")), ("gift".to_string(), Value::Null)]),
            ..Default::default()
        }
    }

    #[test]
    fn property_prefers_named_fields_then_attribute_bag() {
        let record = CatalogRecord::from(shirt());
        assert_eq!(record.property("sku"), Some(json!("SHIRT-7")));
        assert_eq!(record.property("description"), Some(json!("Breathable")));
        assert_eq!(record.property("image"), None);
        assert_eq!(record.property("gift"), None);
        assert_eq!(record.property("unknown"), None);
    }

    #[test]
    fn store_assignment_defaults_to_all_stores() {
        let mut product = shirt();
        assert!(CatalogRecord::from(product.clone()).in_store("fr"));

        product.store_codes = vec!["default".into()];
        let record = CatalogRecord::from(product);
        assert!(record.in_store("default"));
        assert!(!record.in_store("fr"));
    }

    #[test]
    fn deserializes_tagged_records() {
        let record: CatalogRecord = serde_json::from_value(json!({
            "type": "category",
            "entity_id": 3,
            "name": "Shoes",
            "parent_id": 2,
            "level": 2
        }))
        .expect("category record");

        assert_eq!(record.shape(), RecordShape::Category);
        assert_eq!(record.entity_id(), 3);
        assert!(record.as_product().is_none());
        assert_eq!(record.property("parent_id"), Some(json!(2)));
    }
}
