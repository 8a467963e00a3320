//! Purchase flow construction.
//!
//! - `request`: The flow-launch request handed to the backend (`FlowRequest`)
//! - `builder`: Builds requests from cached catalog entries (`FlowBuilder`)

mod builder;
mod request;

pub use builder::FlowBuilder;
pub use request::{FlowRequest, ProductFlowParams, ReplacementMode, SubscriptionUpdate};
