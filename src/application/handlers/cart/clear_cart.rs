//! ClearCartHandler - Command handler for emptying the cart.

use std::sync::Arc;

use crate::domain::cart::CartError;
use crate::domain::foundation::UserId;
use crate::ports::CartRepository;

#[derive(Debug, Clone)]
pub struct ClearCartCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCartResult {
    pub removed: u64,
}

pub struct ClearCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl ClearCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(&self, cmd: ClearCartCommand) -> Result<ClearCartResult, CartError> {
        let removed = match self.carts.find_by_user(&cmd.user_id).await? {
            Some(cart) => self.carts.clear(cart.id).await?,
            None => 0,
        };

        tracing::debug!(user_id = %cmd.user_id, removed, "Cart cleared");
        Ok(ClearCartResult { removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::cart::CartLine;
    use crate::domain::foundation::MovieId;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn clears_every_line() {
        let store = Arc::new(InMemoryStore::new());
        let cart = store.get_or_create(&user()).await.unwrap();
        for id in [1, 2, 3] {
            store
                .add_line(cart.id, &CartLine::new(MovieId::new(id).unwrap()))
                .await
                .unwrap();
        }

        let result = ClearCartHandler::new(store.clone())
            .handle(ClearCartCommand { user_id: user() })
            .await
            .unwrap();

        assert_eq!(result.removed, 3);
        assert!(store.find_by_user(&user()).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clearing_without_cart_is_noop() {
        let store = Arc::new(InMemoryStore::new());

        let result = ClearCartHandler::new(store)
            .handle(ClearCartCommand { user_id: user() })
            .await
            .unwrap();

        assert_eq!(result.removed, 0);
    }
}
