//! Cart repository port.

use async_trait::async_trait;

use crate::domain::cart::{Cart, CartLine};
use crate::domain::foundation::{CartId, DomainError, MovieId, UserId};

/// Persistence for the per-user cart.
///
/// Implementations must enforce one cart per user and one line per
/// (cart, movie); a duplicate line is reported as `MovieAlreadyInCart`.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Returns the user's cart, creating an empty one on first access.
    async fn get_or_create(&self, user_id: &UserId) -> Result<Cart, DomainError>;

    /// Returns the user's cart without creating it.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Cart>, DomainError>;

    /// Inserts a line.
    ///
    /// # Errors
    ///
    /// - `MovieAlreadyInCart` when the movie already has a line
    /// - `DatabaseError` on persistence failure
    async fn add_line(&self, cart_id: CartId, line: &CartLine) -> Result<(), DomainError>;

    /// Deletes a line; false when there was nothing to delete.
    async fn remove_line(&self, cart_id: CartId, movie_id: MovieId) -> Result<bool, DomainError>;

    /// Deletes every line; returns how many were removed.
    async fn clear(&self, cart_id: CartId) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CartRepository) {}
    }
}
