//! RemoveMovieFromCartHandler - Command handler for removing one cart line.

use std::sync::Arc;

use crate::domain::cart::CartError;
use crate::domain::foundation::{MovieId, UserId};
use crate::ports::CartRepository;

#[derive(Debug, Clone)]
pub struct RemoveMovieFromCartCommand {
    pub user_id: UserId,
    pub movie_id: MovieId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveMovieFromCartResult {
    /// False when the movie was not in the cart.
    pub removed: bool,
}

pub struct RemoveMovieFromCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl RemoveMovieFromCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(
        &self,
        cmd: RemoveMovieFromCartCommand,
    ) -> Result<RemoveMovieFromCartResult, CartError> {
        let Some(cart) = self.carts.find_by_user(&cmd.user_id).await? else {
            return Ok(RemoveMovieFromCartResult { removed: false });
        };

        let removed = self.carts.remove_line(cart.id, cmd.movie_id).await?;
        Ok(RemoveMovieFromCartResult { removed })
    }
}
