//! Cart domain module.
//!
//! The per-user basket of movies waiting for checkout.

mod aggregate;
mod errors;

pub use aggregate::{Cart, CartLine};
pub use errors::CartError;
