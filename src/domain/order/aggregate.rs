//! Order aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Money, MovieId, OrderId, OrderLineId, OwnedByUser, StateMachine, Timestamp, UserId,
};

use super::{CheckoutPlan, OrderError, OrderStatus};

/// A purchased movie with its catalog price frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub movie_id: MovieId,
    pub price_at_order: Money,
}

/// Immutable-priced snapshot of a checkout.
///
/// Lines and prices never change after creation; only `status` moves, and
/// only through the [`OrderStatus`] state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub lines: Vec<OrderLine>,
    pub created_at: Timestamp,
}

impl Order {
    /// Creates a pending order from a checkout plan.
    pub fn place(user_id: UserId, plan: &CheckoutPlan) -> Result<Self, OrderError> {
        if plan.lines.is_empty() {
            return Err(OrderError::no_eligible_movie(plan.excluded.clone()));
        }

        let lines: Vec<OrderLine> = plan
            .lines
            .iter()
            .map(|l| OrderLine {
                id: OrderLineId::new(),
                movie_id: l.movie_id,
                price_at_order: l.price,
            })
            .collect();

        Ok(Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            total_amount: lines.iter().map(|l| l.price_at_order).sum(),
            lines,
            created_at: Timestamp::now(),
        })
    }

    /// Sum of the frozen line prices.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|l| l.price_at_order).sum()
    }

    /// False when the stored total no longer matches its lines.
    pub fn has_consistent_total(&self) -> bool {
        self.total_amount == self.lines_total()
    }

    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.lines.iter().map(|l| l.movie_id).collect()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// User-initiated cancel. Only pending orders can be canceled this way.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::invalid_transition(
                self.status,
                OrderStatus::Canceled,
            ));
        }
        self.status = OrderStatus::Canceled;
        Ok(())
    }

    /// Applies a reconciled status change (payment success or refund).
    pub fn apply_status(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        self.status = self.status.transition_to(target)?;
        Ok(())
    }
}

impl OwnedByUser for Order {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}
