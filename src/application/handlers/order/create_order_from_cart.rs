//! CreateOrderFromCartHandler - Command handler for checkout.
//!
//! Turns the eligible cart lines into a pending order with prices frozen
//! from the catalog. Lines for movies the user already owns, has in another
//! pending order, or that the catalog dropped are reported and stay in the
//! cart.

use std::sync::Arc;

use crate::domain::foundation::{Money, MovieId, UserId};
use crate::domain::order::{plan_checkout, CheckoutContext, ExcludedLine, Order, OrderError};
use crate::ports::{CartRepository, CatalogLookup, OrderRepository};

#[derive(Debug, Clone)]
pub struct CreateOrderFromCartCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct CreateOrderFromCartResult {
    pub order: Order,
    pub excluded: Vec<ExcludedLine>,
}

pub struct CreateOrderFromCartHandler {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogLookup>,
}

impl CreateOrderFromCartHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogLookup>,
    ) -> Self {
        Self {
            carts,
            orders,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateOrderFromCartCommand,
    ) -> Result<CreateOrderFromCartResult, OrderError> {
        // 1. Load the cart
        let cart = match self.carts.find_by_user(&cmd.user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(OrderError::empty_cart()),
        };
        let movie_ids = cart.movie_ids();

        // 2. Gather what the planner needs
        let listings = self.catalog.get_movies(&movie_ids).await?;
        let context = CheckoutContext {
            prices: listings
                .into_iter()
                .map(|(id, listing)| (id, listing.price))
                .collect::<std::collections::HashMap<MovieId, Money>>(),
            purchased: self.orders.purchased_movie_ids(&cmd.user_id).await?,
            pending: self.orders.pending_movie_ids(&cmd.user_id).await?,
        };

        // 3. Decide which lines convert
        let plan = match plan_checkout(&movie_ids, &context) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::info!(user_id = %cmd.user_id, error = %err, "Checkout refused");
                return Err(err);
            }
        };
        for excluded in &plan.excluded {
            tracing::info!(
                user_id = %cmd.user_id,
                movie_id = %excluded.movie_id,
                reason = %excluded.reason,
                "Cart line excluded from order"
            );
        }

        // 4. Persist the order and drop the converted lines atomically
        let order = Order::place(cmd.user_id.clone(), &plan)?;
        self.orders.create_from_cart(&order, cart.id).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total_amount,
            lines = order.lines.len(),
            excluded = plan.excluded.len(),
            "Order created from cart"
        );

        Ok(CreateOrderFromCartResult {
            order,
            excluded: plan.excluded,
        })
    }
}
