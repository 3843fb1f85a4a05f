//! Checkout planning.
//!
//! Decides which cart lines become order lines. Pure: the caller gathers the
//! catalog prices and the user's purchased/pending movie sets, the planner only
//! decides.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, MovieId};

use super::OrderError;

/// Why a cart line did not make it into the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The user holds a paid order line for the movie.
    AlreadyPurchased,
    /// The movie sits in another of the user's pending orders.
    PendingInAnotherOrder,
    /// The catalog no longer resolves the movie.
    MovieUnavailable,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::AlreadyPurchased => "already_purchased",
            ExclusionReason::PendingInAnotherOrder => "pending_in_another_order",
            ExclusionReason::MovieUnavailable => "movie_unavailable",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ExclusionReason::AlreadyPurchased => "already purchased",
            ExclusionReason::PendingInAnotherOrder => "already in another pending order",
            ExclusionReason::MovieUnavailable => "no longer available",
        }
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedLine {
    pub movie_id: MovieId,
    pub reason: ExclusionReason,
}

/// A cart line that converts, with the catalog price frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub movie_id: MovieId,
    pub price: Money,
}

/// Everything the user's situation looks like at checkout time.
#[derive(Debug, Clone, Default)]
pub struct CheckoutContext {
    /// Current catalog price per movie; missing entries are unavailable.
    pub prices: HashMap<MovieId, Money>,
    pub purchased: HashSet<MovieId>,
    pub pending: HashSet<MovieId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub excluded: Vec<ExcludedLine>,
}

impl CheckoutPlan {
    pub fn converted_movie_ids(&self) -> Vec<MovieId> {
        self.lines.iter().map(|l| l.movie_id).collect()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.price).sum()
    }
}

/// Splits the cart into converting and excluded lines.
///
/// Fails with `EmptyCart` when there is nothing to check out and with
/// `NoEligibleMovie` when every line is excluded.
pub fn plan_checkout(
    cart_movies: &[MovieId],
    context: &CheckoutContext,
) -> Result<CheckoutPlan, OrderError> {
    if cart_movies.is_empty() {
        return Err(OrderError::empty_cart());
    }

    let mut lines = Vec::with_capacity(cart_movies.len());
    let mut excluded = Vec::new();

    for &movie_id in cart_movies {
        let reason = if context.purchased.contains(&movie_id) {
            Some(ExclusionReason::AlreadyPurchased)
        } else if context.pending.contains(&movie_id) {
            Some(ExclusionReason::PendingInAnotherOrder)
        } else {
            None
        };

        match (reason, context.prices.get(&movie_id)) {
            (Some(reason), _) => excluded.push(ExcludedLine { movie_id, reason }),
            (None, Some(&price)) => lines.push(PlannedLine { movie_id, price }),
            (None, None) => excluded.push(ExcludedLine {
                movie_id,
                reason: ExclusionReason::MovieUnavailable,
            }),
        }
    }

    if lines.is_empty() {
        return Err(OrderError::no_eligible_movie(excluded));
    }

    Ok(CheckoutPlan { lines, excluded })
}
