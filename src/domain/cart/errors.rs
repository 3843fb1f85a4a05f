//! Cart-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | MovieNotFound | 404 |
//! | NotInCart | 404 |
//! | AlreadyInCart | 409 |
//! | AlreadyPurchased | 409 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, MovieId};

/// Cart-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The catalog does not know this movie.
    MovieNotFound(MovieId),

    /// The movie already has a line in the cart.
    AlreadyInCart(MovieId),

    /// The user already owns the movie through a paid order.
    AlreadyPurchased(MovieId),

    /// Removal target is not in the cart.
    NotInCart(MovieId),

    /// Infrastructure error.
    Infrastructure(String),
}

impl CartError {
    pub fn movie_not_found(movie_id: MovieId) -> Self {
        CartError::MovieNotFound(movie_id)
    }

    pub fn already_in_cart(movie_id: MovieId) -> Self {
        CartError::AlreadyInCart(movie_id)
    }

    pub fn already_purchased(movie_id: MovieId) -> Self {
        CartError::AlreadyPurchased(movie_id)
    }

    pub fn not_in_cart(movie_id: MovieId) -> Self {
        CartError::NotInCart(movie_id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CartError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CartError::MovieNotFound(_) => ErrorCode::MovieNotFound,
            CartError::AlreadyInCart(_) => ErrorCode::MovieAlreadyInCart,
            CartError::AlreadyPurchased(_) => ErrorCode::MovieAlreadyPurchased,
            CartError::NotInCart(_) => ErrorCode::MovieNotInCart,
            CartError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            CartError::MovieNotFound(id) => format!("Movie {} not found", id),
            CartError::AlreadyInCart(id) => format!("Movie {} is already in the cart", id),
            CartError::AlreadyPurchased(id) => format!(
                "Movie {} has already been purchased; repurchase is not possible",
                id
            ),
            CartError::NotInCart(id) => format!("Movie {} is not in the cart", id),
            CartError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CartError::Infrastructure(_))
    }
}

impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CartError {}

impl From<DomainError> for CartError {
    fn from(err: DomainError) -> Self {
        CartError::Infrastructure(err.to_string())
    }
}

impl From<CartError> for DomainError {
    fn from(err: CartError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
