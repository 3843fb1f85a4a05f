//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations over the
//! ports. Each handler owns its dependencies as `Arc<dyn Port>`.

pub mod cart;
pub mod order;
pub mod payment;

pub use cart::*;
pub use order::*;
pub use payment::*;
