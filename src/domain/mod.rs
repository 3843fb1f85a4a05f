//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `cart` - Per-user basket of movies
//! - `order` - Checkout planning and the order lifecycle
//! - `payment` - Payment attempts, Stripe events and reconciliation

pub mod cart;
pub mod foundation;
pub mod order;
pub mod payment;
