//! Keyed stores populated from translator output.
//!
//! Both caches are last-write-wins: an incoming record replaces whatever was
//! stored under its key, it is never merged with it.

mod catalog;
mod ledger;

pub use catalog::CatalogCache;
pub use ledger::PurchaseLedger;
