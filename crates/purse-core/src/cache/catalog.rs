use std::collections::HashMap;

use crate::error::{PurseError, Result};
use crate::model::CatalogEntry;

/// Catalog entries keyed by product id.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<String, CatalogEntry>,
}

impl CatalogCache {
    /// Creates a new empty CatalogCache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores each entry under its product id, replacing any previous entry.
    pub fn replace_all<'a>(&mut self, entries: impl IntoIterator<Item = &'a CatalogEntry>) {
        for entry in entries {
            self.entries
                .insert(entry.product_id.clone(), entry.clone());
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(product_id)
    }

    /// Like [`get`](Self::get), failing with `NotFound` for unknown ids.
    pub fn require(&self, product_id: &str) -> Result<&CatalogEntry> {
        self.get(product_id)
            .ok_or_else(|| PurseError::not_found("CatalogEntry", product_id))
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.entries.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by product id.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<_> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OneTimeOffer, ProductKind};

    fn entry(product_id: &str, title: &str, priced: bool) -> CatalogEntry {
        CatalogEntry {
            product_id: product_id.to_string(),
            name: title.to_string(),
            title: title.to_string(),
            description: format!("{title} description"),
            kind: ProductKind::OneTime,
            one_time_offer: priced.then(|| OneTimeOffer {
                formatted_price: "$1.00".to_string(),
                price_amount_micros: 1_000_000,
                price_currency_code: "USD".to_string(),
            }),
            subscription_offers: Vec::new(),
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut cache = CatalogCache::new();
        cache.replace_all(&[entry("p1", "Old", true)]);
        cache.replace_all(&[entry("p1", "New", false)]);

        let stored = cache.get("p1").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(stored.title, "New");
        assert_eq!(stored.description, "New description");
        assert!(stored.one_time_offer.is_none());
    }

    #[test]
    fn test_require_unknown_is_not_found() {
        let cache = CatalogCache::new();
        assert!(cache.require("missing").unwrap_err().is_not_found());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_sorted() {
        let mut cache = CatalogCache::new();
        cache.replace_all(&[entry("b", "B", true), entry("a", "A", true)]);

        let ids: Vec<_> = cache.entries().into_iter().map(|e| e.product_id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
