use purse_core::backend::{RawProductDetails, RawPurchase};
use purse_core::error::Result;
use purse_core::model::ProductKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed data for a [`SandboxBackend`](super::SandboxBackend).
///
/// ```json
/// {
///   "package_name": "com.example.game",
///   "products": [{ "product_id": "coins", "product_type": "inapp", ... }],
///   "purchases": [{ "kind": "one_time", "purchase_token": "t1", ... }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxFixture {
    /// Stamped on every purchase the sandbox mints.
    pub package_name: String,
    /// Makes connection setup answer `BILLING_UNAVAILABLE`.
    pub fail_connect: bool,
    pub products: Vec<RawProductDetails>,
    /// Purchases owned before the session starts.
    pub purchases: Vec<OwnedPurchase>,
}

/// A fixture purchase tagged with the kind it is queried under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedPurchase {
    pub kind: ProductKind,
    #[serde(flatten)]
    pub purchase: RawPurchase,
}

impl SandboxFixture {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let fixture = Self::from_json_str(&content)?;
        tracing::debug!(
            "[Sandbox] Loaded fixture {} ({} products, {} purchases)",
            path.display(),
            fixture.products.len(),
            fixture.purchases.len()
        );
        Ok(fixture)
    }

    /// The kind a fixture product is sold as, if it is known and well-typed.
    pub fn product_kind(&self, product_id: &str) -> Option<ProductKind> {
        self.products
            .iter()
            .find(|p| p.product_id == product_id)
            .and_then(|p| ProductKind::from_wire(&p.product_type))
    }
}
