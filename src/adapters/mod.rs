//! Adapters - Implementations of port interfaces.
//!
//! - `http` - axum REST API
//! - `memory` - in-process store, catalog and webhook log
//! - `postgres` - sqlx repositories
//! - `stripe` - Stripe Checkout and Refunds over reqwest

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
