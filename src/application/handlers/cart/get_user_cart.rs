//! GetUserCartHandler - Admin query for any user's cart.
//!
//! Callers are expected to have checked the admin role already.

use std::sync::Arc;

use crate::domain::cart::{Cart, CartError};
use crate::domain::foundation::UserId;
use crate::ports::CartRepository;

#[derive(Debug, Clone)]
pub struct GetUserCartQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct GetUserCartResult {
    /// `None` when the user never touched a cart.
    pub cart: Option<Cart>,
}

pub struct GetUserCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl GetUserCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(&self, query: GetUserCartQuery) -> Result<GetUserCartResult, CartError> {
        let cart = self.carts.find_by_user(&query.user_id).await?;
        Ok(GetUserCartResult { cart })
    }
}
