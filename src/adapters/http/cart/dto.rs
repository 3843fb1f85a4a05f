//! HTTP DTOs for cart endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::cart::GetCartResult;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::foundation::Money;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct AddMovieRequest {
    pub movie_id: i64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineResponse {
    pub movie_id: i64,
    /// Catalog name, absent when the movie is no longer listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Current catalog price, absent when the movie is no longer listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    /// ISO 8601.
    pub added_at: String,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            movie_id: line.movie_id.value(),
            name: None,
            price: None,
            added_at: line.added_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<CartLineResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id.to_string(),
            user_id: cart.user_id.to_string(),
            lines: cart.lines.iter().map(CartLineResponse::from).collect(),
            total: None,
        }
    }
}

impl From<GetCartResult> for CartResponse {
    fn from(result: GetCartResult) -> Self {
        let mut response = CartResponse::from(&result.cart);
        for line in &mut response.lines {
            let listing = crate::domain::foundation::MovieId::new(line.movie_id)
                .ok()
                .and_then(|id| result.listings.get(&id));
            if let Some(listing) = listing {
                line.name = Some(listing.name.clone());
                line.price = Some(listing.price);
            }
        }
        response.total = Some(result.current_total());
        response
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMovieResponse {
    pub movie_id: i64,
    pub added_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCartResponse {
    pub removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MovieId, UserId};
    use crate::ports::MovieListing;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn cart_view_merges_listings() {
        let mut cart = Cart::new(UserId::new("user-1").unwrap());
        cart.add_line(MovieId::new(7).unwrap()).unwrap();
        cart.add_line(MovieId::new(8).unwrap()).unwrap();
        let price = Money::from_decimal(dec!(12.99)).unwrap();
        let mut listings = HashMap::new();
        listings.insert(
            MovieId::new(7).unwrap(),
            MovieListing {
                id: MovieId::new(7).unwrap(),
                name: "Metropolis".to_string(),
                price,
            },
        );

        let response = CartResponse::from(GetCartResult { cart, listings });

        assert_eq!(response.lines[0].name.as_deref(), Some("Metropolis"));
        assert!(response.lines[1].name.is_none());
        assert_eq!(response.total, Some(price));
    }
}
