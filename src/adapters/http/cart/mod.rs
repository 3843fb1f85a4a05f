//! Cart HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{AddMovieRequest, AddMovieResponse, CartLineResponse, CartResponse, ClearCartResponse};
pub use routes::cart_routes;
