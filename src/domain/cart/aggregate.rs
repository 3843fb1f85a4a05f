//! Cart aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CartId, MovieId, OwnedByUser, Timestamp, UserId};

use super::CartError;

/// A movie waiting in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub movie_id: MovieId,
    pub added_at: Timestamp,
}

impl CartLine {
    pub fn new(movie_id: MovieId) -> Self {
        Self {
            movie_id,
            added_at: Timestamp::now(),
        }
    }
}

/// One cart per user, created lazily on first access.
///
/// Holds at most one line per movie. Converting the cart into an order removes
/// the converted lines; the cart itself is never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub created_at: Timestamp,
}

impl Cart {
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.lines.iter().any(|l| l.movie_id == movie_id)
    }

    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.lines.iter().map(|l| l.movie_id).collect()
    }

    /// Adds a line, rejecting duplicates.
    pub fn add_line(&mut self, movie_id: MovieId) -> Result<CartLine, CartError> {
        if self.contains(movie_id) {
            return Err(CartError::already_in_cart(movie_id));
        }
        let line = CartLine::new(movie_id);
        self.lines.push(line.clone());
        Ok(line)
    }

    /// Removes the line for `movie_id`; false when it was not in the cart.
    pub fn remove_line(&mut self, movie_id: MovieId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.movie_id != movie_id);
        self.lines.len() != before
    }

    /// Removes the given movies, keeping everything else.
    pub fn remove_lines(&mut self, movie_ids: &[MovieId]) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| !movie_ids.contains(&l.movie_id));
        before - self.lines.len()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.lines.len();
        self.lines.clear();
        removed
    }
}

impl OwnedByUser for Cart {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(UserId::new("user-1").unwrap())
    }

    fn movie(id: i64) -> MovieId {
        MovieId::new(id).unwrap()
    }

    #[test]
    fn new_cart_is_empty() {
        assert!(cart().is_empty());
    }

    #[test]
    fn add_line_appends_movie() {
        let mut cart = cart();
        let line = cart.add_line(movie(7)).unwrap();
        assert_eq!(line.movie_id, movie(7));
        assert!(cart.contains(movie(7)));
    }

    #[test]
    fn add_line_rejects_duplicate() {
        let mut cart = cart();
        cart.add_line(movie(7)).unwrap();
        let result = cart.add_line(movie(7));
        assert_eq!(result, Err(CartError::AlreadyInCart(movie(7))));
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn remove_line_reports_whether_anything_was_removed() {
        let mut cart = cart();
        cart.add_line(movie(7)).unwrap();
        assert!(cart.remove_line(movie(7)));
        assert!(!cart.remove_line(movie(7)));
    }

    #[test]
    fn remove_lines_keeps_unlisted_movies() {
        let mut cart = cart();
        cart.add_line(movie(1)).unwrap();
        cart.add_line(movie(2)).unwrap();
        cart.add_line(movie(3)).unwrap();

        assert_eq!(cart.remove_lines(&[movie(1), movie(3)]), 2);
        assert_eq!(cart.movie_ids(), vec![movie(2)]);
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = cart();
        cart.add_line(movie(1)).unwrap();
        cart.add_line(movie(2)).unwrap();
        assert_eq!(cart.clear(), 2);
        assert!(cart.is_empty());
    }
}
