//! Session domain module.
//!
//! Holds the state owned by one purchase session and the rules for
//! mutating it. Nothing here is asynchronous: the application layer wraps
//! [`SessionState`] in a single lock and feeds it inputs in arrival order.
//!
//! # Module Structure
//!
//! - `state`: Caches, connection machine and config (`SessionState`)
//! - `batch`: Catalog query batch assembly (`pair_queries`, `pair_wire_queries`)

mod batch;
mod state;

pub use batch::{pair_queries, pair_wire_queries};
pub use state::SessionState;
