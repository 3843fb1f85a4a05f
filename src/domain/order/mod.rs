//! Order module - checkout snapshots and their lifecycle.

mod aggregate;
mod checkout;
mod errors;
mod status;

pub use aggregate::{Order, OrderLine};
pub use checkout::{
    plan_checkout, CheckoutContext, CheckoutPlan, ExcludedLine, ExclusionReason, PlannedLine,
};
pub use errors::OrderError;
pub use status::OrderStatus;
