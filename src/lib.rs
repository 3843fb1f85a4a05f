//! Cinema Storefront - online cinema checkout backend.
//!
//! Users collect movies in a cart, check the cart out into an order with
//! frozen prices, and pay through Stripe hosted checkout. Stripe webhooks
//! drive payment and order status, including refunds.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
