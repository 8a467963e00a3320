//! Purchase session core.
//!
//! Domain layer of the purse workspace: the canonical record model, the
//! backend contract, the result translator, the session caches and the
//! rules that turn backend callbacks into caller-facing events.

pub mod backend;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod flow;
pub mod model;
pub mod session;
pub mod translate;

// Re-export common types
pub use backend::BillingBackend;
pub use connection::{ConnectAttempt, ConnectionState};
pub use error::PurseError;
pub use event::BillingEvent;
pub use session::SessionState;
