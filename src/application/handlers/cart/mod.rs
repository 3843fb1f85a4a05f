//! Cart handlers.
//!
//! ## Commands
//! - Adding, removing and clearing cart lines
//!
//! ## Queries
//! - The caller's cart with current listings
//! - Any user's cart (admin)

mod add_movie_to_cart;
mod clear_cart;
mod get_cart;
mod get_user_cart;
mod remove_movie_from_cart;

// Commands
pub use add_movie_to_cart::{AddMovieToCartCommand, AddMovieToCartHandler, AddMovieToCartResult};
pub use clear_cart::{ClearCartCommand, ClearCartHandler, ClearCartResult};
pub use remove_movie_from_cart::{
    RemoveMovieFromCartCommand, RemoveMovieFromCartHandler, RemoveMovieFromCartResult,
};

// Queries
pub use get_cart::{GetCartHandler, GetCartQuery, GetCartResult};
pub use get_user_cart::{GetUserCartHandler, GetUserCartQuery, GetUserCartResult};
