//! Product map and the built-in product field resolvers.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use feed_types::{FeedConfig, FeedError, RecordShape};
use feed_util::{CATEGORY_SEPARATOR, CATEGORY_TREE_SEPARATOR, ConfigStore, flatten_category_tree, format_price, load_feed_config};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    BaseMap, FeedMap,
    registry::{ResolveContext, ResolverRegistry, resolver},
};
use crate::{helper::ProductHelper, item::Item};

pub const ID_FIELD: &str = "df_id";
pub const URL_FIELD: &str = "url_key";
pub const CATEGORIES_FIELD: &str = "category_ids";
pub const IMAGE_FIELD: &str = "image";
pub const PRICE_FIELD: &str = "price";
pub const AVAILABILITY_FIELD: &str = "df_availability";
pub const CURRENCY_FIELD: &str = "df_currency";
pub const QUANTITY_AND_STOCK_STATUS_FIELD: &str = "quantity_and_stock_status";
/// Select attributes exported as their option label.
pub const ATTRIBUTE_TEXT_FIELDS: [&str; 4] = ["color", "tax_class_id", "manufacturer", "weight_type"];

/// Maps product items to feed values through a resolver registry.
///
/// Holds configuration only; every lookup is a function of the item and that
/// configuration. Fields without a registered resolver fall back to a plain
/// property lookup on the record.
pub struct ProductMap {
    helper: Arc<dyn ProductHelper>,
    config: FeedConfig,
    resolvers: ResolverRegistry,
    fallback: BaseMap,
}

impl ProductMap {
    /// Create a map with the built-in product resolvers.
    pub fn new(helper: Arc<dyn ProductHelper>, config: FeedConfig) -> Self {
        Self {
            helper,
            config,
            resolvers: default_product_resolvers(),
            fallback: BaseMap,
        }
    }

    /// Create a map reading the feed settings of `store_code` from a configuration store.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] when a setting cannot be interpreted.
    pub fn from_config_store(helper: Arc<dyn ProductHelper>, store: &dyn ConfigStore, store_code: &str) -> Result<Self, FeedError> {
        let config = load_feed_config(store, store_code)?;
        Ok(Self::new(helper, config))
    }

    /// Register an additional resolver or override a built-in one.
    ///
    /// Resolvers may read other fields through [`ResolveContext::get`]. A
    /// resolver that asks for its own field gets `None` back.
    pub fn with_resolver<F>(mut self, field: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&ResolveContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.resolvers.register(field, resolve);
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }
}

impl FeedMap for ProductMap {
    fn required_shape(&self) -> Option<RecordShape> {
        Some(RecordShape::Product)
    }

    fn resolve(&self, item: &Item, field: &str) -> Option<Value> {
        let Some(product) = item.context().as_product() else {
            warn!(entity_id = item.context().entity_id(), field = %field, "product map asked to resolve a non-product item");
            return None;
        };
        let Some(resolve) = self.resolvers.get(field) else {
            debug!(entity_id = product.entity_id, field = %field, "no resolver registered; using property lookup");
            return self.fallback.resolve(item, field);
        };

        let context = ResolveContext {
            item,
            product,
            field,
            config: &self.config,
            helper: self.helper.as_ref(),
            map: self,
        };
        match resolve(&context) {
            Ok(value) => value,
            Err(error) => {
                warn!(entity_id = product.entity_id, field = %field, error = %error, "field resolution failed; exporting null");
                None
            }
        }
    }
}

fn default_product_resolvers() -> ResolverRegistry {
    let mut registry = ResolverRegistry::new();
    registry
        .register(ID_FIELD, resolve_id)
        .register(URL_FIELD, resolve_url)
        .register(CATEGORIES_FIELD, resolve_categories)
        .register(IMAGE_FIELD, resolve_image)
        .register(PRICE_FIELD, resolve_price)
        .register(AVAILABILITY_FIELD, resolve_availability)
        .register(CURRENCY_FIELD, resolve_currency)
        .register(QUANTITY_AND_STOCK_STATUS_FIELD, resolve_quantity_and_stock_status)
        .register_shared(&ATTRIBUTE_TEXT_FIELDS, resolver(resolve_attribute_text));
    registry
}

fn resolve_id(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    ctx.helper.product_id(ctx.product).map(Some)
}

fn resolve_url(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    Ok(ctx.helper.product_url(ctx.product)?.map(Value::from))
}

/// Flattens every category path: `Men > Shirts % Sale`.
fn resolve_categories(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    let tree = ctx
        .helper
        .product_categories_with_parents(ctx.product, ctx.config.categories_in_navigation)?;
    if tree.is_empty() {
        return Ok(None);
    }

    let names: Vec<Vec<&str>> = tree
        .iter()
        .map(|path| path.iter().map(|category| category.name.as_str()).collect())
        .collect();
    Ok(Some(Value::from(flatten_category_tree(
        &names,
        CATEGORY_TREE_SEPARATOR,
        CATEGORY_SEPARATOR,
    ))))
}

fn resolve_image(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    let size = ctx.config.image_size.as_deref();
    Ok(ctx.helper.product_image_url(ctx.product, size)?.map(Value::from))
}

/// Prices below the configured minimum are not exported.
fn resolve_price(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    if !ctx.config.export_product_prices {
        return Ok(None);
    }

    let price = ctx.helper.product_price(ctx.product)?;
    if !price.is_finite() {
        return Err(anyhow!("product {} has a non-finite price", ctx.product.entity_id));
    }
    if price < ctx.config.minimal_price {
        return Ok(None);
    }
    Ok(Some(Value::from(format_price(price))))
}

fn resolve_availability(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    let availability = ctx.helper.product_availability(ctx.product)?;
    Ok(Some(Value::from(availability.as_str())))
}

fn resolve_currency(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    Ok(Some(Value::from(ctx.helper.currency_code()?)))
}

fn resolve_quantity_and_stock_status(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    Ok(ctx.helper.quantity_and_stock_status(ctx.product)?.map(Value::from))
}

fn resolve_attribute_text(ctx: &ResolveContext<'_>) -> Result<Option<Value>> {
    Ok(ctx.helper.attribute_text(ctx.product, ctx.field)?.map(Value::from))
}
