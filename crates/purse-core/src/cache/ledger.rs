use std::collections::HashMap;

use crate::model::PurchaseRecord;

/// Purchase records keyed by purchase token.
#[derive(Debug, Default)]
pub struct PurchaseLedger {
    records: HashMap<String, PurchaseRecord>,
}

impl PurchaseLedger {
    /// Creates a new empty PurchaseLedger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores each record under its token, replacing any previous record.
    pub fn replace_all<'a>(&mut self, records: impl IntoIterator<Item = &'a PurchaseRecord>) {
        for record in records {
            self.records
                .insert(record.purchase_token.clone(), record.clone());
        }
    }

    pub fn get(&self, purchase_token: &str) -> Option<&PurchaseRecord> {
        self.records.get(purchase_token)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest purchase first.
    pub fn records(&self) -> Vec<PurchaseRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.purchase_time
                .cmp(&b.purchase_time)
                .then_with(|| a.purchase_token.cmp(&b.purchase_token))
        });
        records
    }

    /// Records covering the given product, oldest purchase first.
    pub fn for_product(&self, product_id: &str) -> Vec<PurchaseRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.covers(product_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PurchaseState;

    fn record(token: &str, product: &str, time: i64, acknowledged: bool) -> PurchaseRecord {
        PurchaseRecord {
            purchase_token: token.to_string(),
            products: vec![product.to_string()],
            order_id: Some(format!("GPA.{token}")),
            package_name: "com.example".to_string(),
            purchase_time: time,
            state: PurchaseState::Purchased,
            quantity: 1,
            signature: String::new(),
            acknowledged,
            auto_renewing: false,
            account_identifiers: None,
            pending_update: None,
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut ledger = PurchaseLedger::new();
        ledger.replace_all(&[record("t1", "p1", 10, false)]);
        ledger.replace_all(&[record("t1", "p1", 10, true)]);

        assert_eq!(ledger.len(), 1);
        assert!(ledger.get("t1").unwrap().acknowledged);
    }

    #[test]
    fn test_for_product() {
        let mut ledger = PurchaseLedger::new();
        ledger.replace_all(&[
            record("t2", "p1", 20, false),
            record("t1", "p1", 10, false),
            record("t3", "p2", 5, false),
        ]);

        let tokens: Vec<_> = ledger
            .for_product("p1")
            .into_iter()
            .map(|r| r.purchase_token)
            .collect();
        assert_eq!(tokens, vec!["t1".to_string(), "t2".to_string()]);
        assert!(ledger.for_product("p9").is_empty());
    }
}
