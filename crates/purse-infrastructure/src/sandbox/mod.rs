//! Fixture-driven billing backend for development and scripted runs.
//!
//! # Module Structure
//!
//! - `fixture`: JSON seed data (`SandboxFixture`, `OwnedPurchase`)
//! - `backend`: The [`BillingBackend`](purse_core::BillingBackend) implementation

mod backend;
mod fixture;

pub use backend::SandboxBackend;
pub use fixture::{OwnedPurchase, SandboxFixture};
