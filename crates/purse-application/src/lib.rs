//! Application layer for PURSE.
//!
//! Wires the domain session state to a billing backend: commands go out
//! through [`BillingSession`], callbacks come back through the
//! [`CallbackDispatcher`] and leave as [`purse_core::BillingEvent`]s.

pub mod session;

pub use session::{BillingSession, CallbackDispatcher, EventReceiver};
