use anyhow::{Result, anyhow};
use feed_types::{CategoryRecord, DEFAULT_STORE_CODE, EntityId, ProductRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Availability, ProductHelper};

/// Categories at or above this level are tree roots and never exported.
const ROOT_CATEGORY_LEVEL: u32 = 1;
/// Media placeholder meaning "no image selected".
const NO_SELECTION: &str = "no_selection";

/// Store-scoped settings the helper renders values with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreContext {
    pub store_code: String,
    /// Storefront base URL, e.g. `https://shop.example.com`.
    pub base_url: String,
    /// Media base URL, e.g. `https://shop.example.com/media`.
    pub media_url: String,
    pub currency_code: String,
    /// Suffix appended to product URL keys.
    #[serde(default = "default_url_suffix")]
    pub url_suffix: String,
}

fn default_url_suffix() -> String {
    ".html".to_string()
}

impl Default for StoreContext {
    fn default() -> Self {
        Self {
            store_code: DEFAULT_STORE_CODE.to_string(),
            base_url: String::new(),
            media_url: String::new(),
            currency_code: "USD".to_string(),
            url_suffix: default_url_suffix(),
        }
    }
}

/// Product helper backed by an in-memory category directory and attribute option labels.
#[derive(Debug, Clone, Default)]
pub struct CatalogProductHelper {
    store: StoreContext,
    categories: IndexMap<EntityId, CategoryRecord>,
    /// Attribute code -> option id -> label.
    attribute_options: IndexMap<String, IndexMap<String, String>>,
}

impl CatalogProductHelper {
    pub fn new(store: StoreContext) -> Self {
        Self {
            store,
            categories: IndexMap::new(),
            attribute_options: IndexMap::new(),
        }
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryRecord>) -> Self {
        self.categories
            .extend(categories.into_iter().map(|category| (category.entity_id, category)));
        self
    }

    /// Register option labels for a select attribute.
    pub fn with_attribute_options<K, L>(mut self, attribute: impl Into<String>, options: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        let labels = self.attribute_options.entry(attribute.into()).or_default();
        labels.extend(options.into_iter().map(|(id, label)| (id.into(), label.into())));
        self
    }

    pub fn store(&self) -> &StoreContext {
        &self.store
    }

    /// Root-to-leaf path ending at `category_id`, without the tree roots.
    ///
    /// Returns `None` when the path is broken (missing or inactive node, cycle)
    /// or filtered out by `navigation_only`.
    fn category_path(&self, category_id: EntityId, navigation_only: bool) -> Option<Vec<CategoryRecord>> {
        let mut path = Vec::new();
        let mut next = Some(category_id);

        while let Some(id) = next {
            let category = self.categories.get(&id)?;
            if category.level <= ROOT_CATEGORY_LEVEL {
                break;
            }
            if !category.is_active || (navigation_only && !category.include_in_menu) {
                return None;
            }
            if path.len() >= self.categories.len() {
                // Parent chain loops back on itself.
                return None;
            }
            path.push(category.clone());
            next = category.parent_id;
        }

        path.reverse();
        (!path.is_empty()).then_some(path)
    }
}

/// Option ids selected in a raw attribute value: scalars, comma lists, or arrays.
fn selected_option_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(values) => values.iter().flat_map(selected_option_ids).collect(),
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        other => vec![other.to_string()],
    }
}

fn render_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{}", qty)
    }
}

impl ProductHelper for CatalogProductHelper {
    fn product_id(&self, product: &ProductRecord) -> Result<Value> {
        Ok(Value::from(product.entity_id))
    }

    fn product_url(&self, product: &ProductRecord) -> Result<Option<String>> {
        let base_url = self.store.base_url.trim_end_matches('/');
        let url = match product.url_key.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
            Some(url_key) => format!("{}/{}{}", base_url, url_key, self.store.url_suffix),
            None => format!("{}/catalog/product/view/id/{}", base_url, product.entity_id),
        };
        Ok(Some(url))
    }

    fn product_categories_with_parents(&self, product: &ProductRecord, navigation_only: bool) -> Result<Vec<Vec<CategoryRecord>>> {
        let mut paths: Vec<Vec<CategoryRecord>> = Vec::new();
        for category_id in &product.category_ids {
            let Some(path) = self.category_path(*category_id, navigation_only) else {
                continue;
            };
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        // A path that is a strict prefix of another one adds no information.
        let is_prefix_of_other =
            |candidate: &Vec<CategoryRecord>| paths.iter().any(|other| other.len() > candidate.len() && other.starts_with(candidate));
        let tree = paths.iter().filter(|path| !is_prefix_of_other(*path)).cloned().collect();
        Ok(tree)
    }

    fn product_image_url(&self, product: &ProductRecord, size: Option<&str>) -> Result<Option<String>> {
        let Some(image) = product.image.as_deref().map(str::trim).filter(|image| !image.is_empty() && *image != NO_SELECTION) else {
            return Ok(None);
        };
        let media_url = self.store.media_url.trim_end_matches('/');
        let image = image.trim_start_matches('/');
        let url = match size {
            Some(size) => format!("{}/catalog/product/cache/{}/{}", media_url, size, image),
            None => format!("{}/catalog/product/{}", media_url, image),
        };
        Ok(Some(url))
    }

    fn product_price(&self, product: &ProductRecord) -> Result<f64> {
        product
            .price
            .ok_or_else(|| anyhow!("product {} has no price data", product.entity_id))
    }

    fn product_availability(&self, product: &ProductRecord) -> Result<Availability> {
        let in_stock = product.stock.as_ref().is_some_and(|stock| stock.is_in_stock);
        Ok(if in_stock {
            Availability::InStock
        } else {
            Availability::OutOfStock
        })
    }

    fn currency_code(&self) -> Result<String> {
        if self.store.currency_code.trim().is_empty() {
            return Err(anyhow!("store '{}' has no currency configured", self.store.store_code));
        }
        Ok(self.store.currency_code.clone())
    }

    fn quantity_and_stock_status(&self, product: &ProductRecord) -> Result<Option<String>> {
        Ok(product.stock.as_ref().map(|stock| {
            let status = if stock.is_in_stock { "In Stock" } else { "Out of Stock" };
            format!("{} - {}", render_quantity(stock.qty), status)
        }))
    }

    fn attribute_text(&self, product: &ProductRecord, attribute: &str) -> Result<Option<String>> {
        let (Some(value), Some(options)) = (product.attributes.get(attribute), self.attribute_options.get(attribute)) else {
            return Ok(None);
        };

        let labels: Vec<&str> = selected_option_ids(value)
            .iter()
            .filter_map(|id| options.get(id).map(String::as_str))
            .collect();
        Ok((!labels.is_empty()).then(|| labels.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_types::StockInfo;
    use serde_json::json;

    fn category(entity_id: EntityId, name: &str, parent_id: Option<EntityId>, level: u32) -> CategoryRecord {
        CategoryRecord {
            entity_id,
            name: name.into(),
            parent_id,
            level,
            is_active: true,
            include_in_menu: true,
            ..Default::default()
        }
    }

    fn helper() -> CatalogProductHelper {
        let mut hidden = category(5, "Clearance", Some(2), 2);
        hidden.include_in_menu = false;
        let mut disabled = category(6, "Archive", Some(2), 2);
        disabled.is_active = false;

        CatalogProductHelper::new(StoreContext {
            store_code: "en".into(),
            base_url: "https://shop.example.com/".into(),
            media_url: "https://shop.example.com/media".into(),
            currency_code: "EUR".into(),
            url_suffix: ".html".into(),
        })
        .with_categories([
            category(1, "Root Catalog", None, 0),
            category(2, "Default Category", Some(1), 1),
            category(3, "Men", Some(2), 2),
            category(4, "Shirts", Some(3), 3),
            hidden,
            disabled,
            category(7, "Loop", Some(8), 2),
            category(8, "Pool", Some(7), 3),
        ])
        .with_attribute_options("color", [("10", "Red"), ("11", "Blue")])
    }

    fn names(tree: &[Vec<CategoryRecord>]) -> Vec<Vec<&str>> {
        tree.iter().map(|path| path.iter().map(|category| category.name.as_str()).collect()).collect()
    }

    fn product() -> ProductRecord {
        ProductRecord {
            entity_id: 12,
            url_key: Some("linen-shirt".into()),
            image: Some("/l/i/linen.jpg".into()),
            category_ids: vec![3, 4, 5, 6, 7, 99],
            stock: Some(StockInfo {
                qty: 12.0,
                is_in_stock: true,
            }),
            attributes: IndexMap::from([("color".to_string(), json!("10,11,12"))]),
            ..Default::default()
        }
    }

    #[test]
    fn category_paths_drop_roots_prefixes_and_broken_chains() {
        let tree = helper().product_categories_with_parents(&product(), false).unwrap();
        assert_eq!(names(&tree), vec![vec!["Men", "Shirts"], vec!["Clearance"]]);
    }

    #[test]
    fn navigation_only_drops_hidden_categories() {
        let tree = helper().product_categories_with_parents(&product(), true).unwrap();
        assert_eq!(names(&tree), vec![vec!["Men", "Shirts"]]);
    }

    #[test]
    fn builds_urls() {
        let helper = helper();
        let mut product = product();
        assert_eq!(
            helper.product_url(&product).unwrap().as_deref(),
            Some("https://shop.example.com/linen-shirt.html")
        );
        assert_eq!(
            helper.product_image_url(&product, Some("small_image")).unwrap().as_deref(),
            Some("https://shop.example.com/media/catalog/product/cache/small_image/l/i/linen.jpg")
        );
        assert_eq!(
            helper.product_image_url(&product, None).unwrap().as_deref(),
            Some("https://shop.example.com/media/catalog/product/l/i/linen.jpg")
        );

        product.url_key = None;
        product.image = Some(NO_SELECTION.into());
        assert_eq!(
            helper.product_url(&product).unwrap().as_deref(),
            Some("https://shop.example.com/catalog/product/view/id/12")
        );
        assert_eq!(helper.product_image_url(&product, Some("small_image")).unwrap(), None);
    }

    #[test]
    fn missing_price_is_an_error() {
        let mut product = product();
        assert!(helper().product_price(&product).is_err());
        product.price = Some(9.5);
        assert_eq!(helper().product_price(&product).unwrap(), 9.5);
    }

    #[test]
    fn stock_values() {
        let helper = helper();
        let mut product = product();
        assert_eq!(helper.product_availability(&product).unwrap(), Availability::InStock);
        assert_eq!(helper.quantity_and_stock_status(&product).unwrap().as_deref(), Some("12 - In Stock"));

        product.stock = Some(StockInfo {
            qty: 0.5,
            is_in_stock: false,
        });
        assert_eq!(helper.product_availability(&product).unwrap(), Availability::OutOfStock);
        assert_eq!(
            helper.quantity_and_stock_status(&product).unwrap().as_deref(),
            Some("0.5 - Out of Stock")
        );

        product.stock = None;
        assert_eq!(helper.product_availability(&product).unwrap(), Availability::OutOfStock);
        assert_eq!(helper.quantity_and_stock_status(&product).unwrap(), None);
    }

    #[test]
    fn attribute_text_uses_option_labels() {
        let helper = helper();
        let mut product = product();
        assert_eq!(helper.attribute_text(&product, "color").unwrap().as_deref(), Some("Red, Blue"));

        product.attributes.insert("color".into(), json!(11));
        assert_eq!(helper.attribute_text(&product, "color").unwrap().as_deref(), Some("Blue"));

        product.attributes.insert("color".into(), json!([12]));
        assert_eq!(helper.attribute_text(&product, "color").unwrap(), None);

        assert_eq!(helper.attribute_text(&product, "manufacturer").unwrap(), None);
    }

    #[test]
    fn currency_requires_configuration() {
        assert_eq!(helper().currency_code().unwrap(), "EUR");
        let bare = CatalogProductHelper::new(StoreContext {
            currency_code: String::new(),
            ..Default::default()
        });
        assert!(bare.currency_code().is_err());
    }
}
