//! Purchase session orchestration.
//!
//! # Module Structure
//!
//! - `service`: [`BillingSession`], the caller-facing command surface
//! - `dispatcher`: [`CallbackDispatcher`], the single consumer of backend callbacks

mod dispatcher;
mod service;

pub use dispatcher::CallbackDispatcher;
pub use service::{BillingSession, EventReceiver};
