//! Fetched record wrapper with per-field memoization.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt,
    rc::Rc,
};

use feed_types::CatalogRecord;
use once_cell::unsync::OnceCell;
use serde_json::Value;
use tracing::warn;

/// Cache key: the map scope plus the field name.
type FieldKey = (&'static str, String);

/// One fetched record plus the values already resolved for it.
///
/// Each field is resolved at most once per item and scope, no matter how many
/// times it is requested. Maps use their own scope, so binding the same item to
/// two different maps never mixes their values. The cache lives and dies with
/// the item.
pub struct Item {
    context: CatalogRecord,
    resolved: RefCell<HashMap<FieldKey, Rc<OnceCell<Option<Value>>>>>,
    in_progress: RefCell<HashSet<FieldKey>>,
}

impl Item {
    pub fn new(context: CatalogRecord) -> Self {
        Self {
            context,
            resolved: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(HashSet::new()),
        }
    }

    /// The wrapped record, unchanged.
    pub fn context(&self) -> &CatalogRecord {
        &self.context
    }

    pub fn into_context(self) -> CatalogRecord {
        self.context
    }

    /// Return the memoized value for `field` in `scope`, running `resolve` on first access.
    ///
    /// `resolve` may look up other fields of the same item. A field requested
    /// again while it is still being resolved yields `None` for the inner
    /// request, and only the outer result is cached.
    pub fn memoized<F>(&self, scope: &'static str, field: &str, resolve: F) -> Option<Value>
    where
        F: FnOnce() -> Option<Value>,
    {
        let key = (scope, field.to_string());
        let cell = {
            let mut resolved = self.resolved.borrow_mut();
            Rc::clone(resolved.entry(key.clone()).or_default())
        };
        if let Some(value) = cell.get() {
            return value.clone();
        }

        if !self.in_progress.borrow_mut().insert(key.clone()) {
            warn!(
                entity_id = self.context.entity_id(),
                scope = %scope,
                field = %field,
                "field requested while it is being resolved; returning null"
            );
            return None;
        }
        let value = resolve();
        self.in_progress.borrow_mut().remove(&key);

        cell.get_or_init(|| value).clone()
    }

    /// Whether `field` has already been resolved in `scope`.
    pub fn is_resolved(&self, scope: &'static str, field: &str) -> bool {
        self.resolved
            .borrow()
            .get(&(scope, field.to_string()))
            .is_some_and(|cell| cell.get().is_some())
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("entity_id", &self.context.entity_id())
            .field("shape", &self.context.shape())
            .field("resolved_fields", &self.resolved.borrow().len())
            .finish()
    }
}

impl From<CatalogRecord> for Item {
    fn from(context: CatalogRecord) -> Self {
        Self::new(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_types::ProductRecord;
    use serde_json::json;
    use std::cell::Cell;

    fn item() -> Item {
        Item::new(CatalogRecord::from(ProductRecord {
            entity_id: 42,
            sku: "MUG-42".into(),
            ..Default::default()
        }))
    }

    #[test]
    fn context_is_returned_unchanged() {
        let record = CatalogRecord::from(ProductRecord {
            entity_id: 42,
            sku: "MUG-42".into(),
            ..Default::default()
        });
        let item = Item::new(record.clone());
        assert_eq!(item.context(), &record);
        assert_eq!(item.into_context(), record);
    }

    const SCOPE: &str = "test";

    #[test]
    fn resolves_each_field_once() {
        let item = item();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let value = item.memoized(SCOPE, "sku", || {
                calls.set(calls.get() + 1);
                Some(json!("MUG-42"))
            });
            assert_eq!(value, Some(json!("MUG-42")));
        }
        assert_eq!(calls.get(), 1);
        assert!(item.is_resolved(SCOPE, "sku"));
        assert!(!item.is_resolved(SCOPE, "name"));
    }

    #[test]
    fn null_results_are_memoized_too() {
        let item = item();
        let calls = Cell::new(0);

        for _ in 0..2 {
            let value = item.memoized(SCOPE, "price", || {
                calls.set(calls.get() + 1);
                None
            });
            assert_eq!(value, None);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn resolver_may_read_other_fields() {
        let item = item();
        let value = item.memoized(SCOPE, "label", || {
            let sku = item.memoized(SCOPE, "sku", || Some(json!("MUG-42")))?;
            Some(json!(format!("label for {}", sku.as_str()?)))
        });
        assert_eq!(value, Some(json!("label for MUG-42")));
        assert!(item.is_resolved(SCOPE, "sku"));
    }

    #[test]
    fn scopes_cache_separately() {
        let item = item();
        assert_eq!(item.memoized("raw", "image", || Some(json!("/m/u/mug.jpg"))), Some(json!("/m/u/mug.jpg")));
        assert_eq!(
            item.memoized("product", "image", || Some(json!("https://cdn.example.com/m/u/mug.jpg"))),
            Some(json!("https://cdn.example.com/m/u/mug.jpg"))
        );
        assert!(item.is_resolved("raw", "image"));
        assert!(!item.is_resolved("other", "image"));
    }

    #[test]
    fn self_referencing_field_yields_null_inside_and_caches_outer_result() {
        let item = item();
        let inner_calls = Cell::new(0);

        let value = item.memoized(SCOPE, "loop", || {
            let inner = item.memoized(SCOPE, "loop", || {
                inner_calls.set(inner_calls.get() + 1);
                Some(json!("inner"))
            });
            assert_eq!(inner, None);
            Some(json!("outer"))
        });

        assert_eq!(value, Some(json!("outer")));
        assert_eq!(inner_calls.get(), 0);
        assert_eq!(item.memoized(SCOPE, "loop", || None), Some(json!("outer")));
    }
}
