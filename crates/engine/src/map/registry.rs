use std::{fmt, sync::Arc};

use anyhow::Result;
use feed_types::{FeedConfig, ProductRecord};
use indexmap::IndexMap;
use serde_json::Value;

use super::{FeedMap, MappedItem};
use crate::{helper::ProductHelper, item::Item};

/// Everything a resolver may consult for one field of one product.
pub struct ResolveContext<'a> {
    pub item: &'a Item,
    pub product: &'a ProductRecord,
    /// Name the resolver was invoked for. Shared resolvers branch on it.
    pub field: &'a str,
    pub config: &'a FeedConfig,
    pub helper: &'a dyn ProductHelper,
    pub(crate) map: &'a dyn FeedMap,
}

impl ResolveContext<'_> {
    /// Memoized value of another field of the same item, resolved through the same map.
    ///
    /// Asking for the field currently being resolved returns `None`.
    pub fn get(&self, field: &str) -> Option<Value> {
        MappedItem {
            map: self.map,
            item: self.item,
        }
        .get(field)
    }
}

/// Computes one field value. `Ok(None)` and `Err` both end up as `null` in the feed.
pub type FieldResolver = Arc<dyn Fn(&ResolveContext<'_>) -> Result<Option<Value>> + Send + Sync>;

/// Wrap a closure as a [`FieldResolver`].
pub fn resolver<F>(resolve: F) -> FieldResolver
where
    F: Fn(&ResolveContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(resolve)
}

/// Field name -> resolver table.
///
/// Registering a field never touches the resolvers of other fields.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: IndexMap<String, FieldResolver>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for `field`, replacing any previous resolver.
    pub fn register<F>(&mut self, field: impl Into<String>, resolver: F) -> &mut Self
    where
        F: Fn(&ResolveContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.resolvers.insert(field.into(), Arc::new(resolver));
        self
    }

    /// Register the same resolver for several fields.
    pub fn register_shared(&mut self, fields: &[&str], resolver: FieldResolver) -> &mut Self {
        for field in fields {
            self.resolvers.insert((*field).to_string(), Arc::clone(&resolver));
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldResolver> {
        self.resolvers.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.resolvers.contains_key(field)
    }

    /// Registered field names in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields()).finish()
    }
}
