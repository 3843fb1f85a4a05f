//! Pricing a payment attempt against its order.
//!
//! Order lines carry the price frozen at checkout. By the time the user pays,
//! the catalog may have moved on; [`PriceDriftPolicy`] decides what gets
//! charged.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, MovieId, OrderLineId, ValidationError};
use crate::domain::order::Order;

use super::PaymentError;

/// What to charge when catalog prices changed since checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDriftPolicy {
    /// Charge the frozen order prices.
    #[default]
    HonorOrderPrice,
    /// Charge current catalog prices.
    Recalculate,
    /// Refuse to start the attempt.
    Reject,
}

impl FromStr for PriceDriftPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "honor_order_price" => Ok(PriceDriftPolicy::HonorOrderPrice),
            "recalculate" => Ok(PriceDriftPolicy::Recalculate),
            "reject" => Ok(PriceDriftPolicy::Reject),
            other => Err(ValidationError::invalid_format(
                "price_drift_policy",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

/// Catalog price differs from the frozen order price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDrift {
    pub movie_id: MovieId,
    pub order_price: Money,
    pub current_price: Money,
}

/// An order line priced for this attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub order_line_id: OrderLineId,
    pub movie_id: MovieId,
    pub price: Money,
}

/// Result of pricing, including everything worth a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedAttempt {
    pub lines: Vec<PricedLine>,
    pub drifts: Vec<PriceDrift>,
    /// Stored order total, when it disagrees with the sum of its lines.
    pub stored_total_mismatch: Option<Money>,
}

impl PricedAttempt {
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.price).sum()
    }
}

/// Prices every order line under `policy`.
///
/// `current_prices` holds today's catalog prices; movies the catalog no longer
/// resolves keep their order price.
pub fn price_attempt(
    order: &Order,
    current_prices: &HashMap<MovieId, Money>,
    policy: PriceDriftPolicy,
) -> Result<PricedAttempt, PaymentError> {
    let stored_total_mismatch = (!order.has_consistent_total()).then_some(order.total_amount);

    if policy == PriceDriftPolicy::Reject {
        if let Some(stored) = stored_total_mismatch {
            return Err(PaymentError::amount_mismatch(stored, order.lines_total()));
        }
    }

    let mut lines = Vec::with_capacity(order.lines.len());
    let mut drifts = Vec::new();

    for line in &order.lines {
        let current = current_prices.get(&line.movie_id).copied();
        if let Some(current_price) = current.filter(|p| *p != line.price_at_order) {
            drifts.push(PriceDrift {
                movie_id: line.movie_id,
                order_price: line.price_at_order,
                current_price,
            });
        }

        let price = match (policy, current) {
            (PriceDriftPolicy::Recalculate, Some(current_price)) => current_price,
            _ => line.price_at_order,
        };
        lines.push(PricedLine {
            order_line_id: line.id,
            movie_id: line.movie_id,
            price,
        });
    }

    if policy == PriceDriftPolicy::Reject && !drifts.is_empty() {
        return Err(PaymentError::price_drift(drifts));
    }

    Ok(PricedAttempt {
        lines,
        drifts,
        stored_total_mismatch,
    })
}
