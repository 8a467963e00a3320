//! Canonical record tree produced by the result translator.
//!
//! # Module Structure
//!
//! - `result`: Backend status shape (`OperationResult`, `ResponseCode`)
//! - `catalog`: Catalog records (`CatalogEntry`, `SubscriptionOffer`, `PricingPhase`)
//! - `purchase`: Purchase records (`PurchaseRecord`, `PurchaseState`)

mod catalog;
mod purchase;
mod result;

pub use catalog::{
    CatalogEntry, InstallmentPlan, OneTimeOffer, PricingPhase, ProductKind, RecurrenceMode,
    SubscriptionOffer,
};
pub use purchase::{AccountIdentifiers, PendingPurchaseUpdate, PurchaseRecord, PurchaseState};
pub use result::{OperationResult, ResponseCode};
