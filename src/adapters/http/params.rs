//! Path and query parameter parsing shared by the endpoint modules.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::foundation::{OrderId, PaymentId, Timestamp, UserId};

use super::error::ApiError;

pub fn order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid order id: {}", raw)))
}

pub fn payment_id(raw: &str) -> Result<PaymentId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid payment id: {}", raw)))
}

/// Filters accepted by the admin listing endpoints.
///
/// `from` and `to` are RFC 3339 timestamps, both inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminListParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl AdminListParams {
    pub fn user_id(&self) -> Result<Option<UserId>, ApiError> {
        self.user_id
            .as_deref()
            .map(UserId::new)
            .transpose()
            .map_err(ApiError::from)
    }

    /// Parses `status` with the given status type.
    pub fn status<S>(&self) -> Result<Option<S>, ApiError>
    where
        S: std::str::FromStr,
        S::Err: Into<ApiError>,
    {
        self.status
            .as_deref()
            .map(str::parse::<S>)
            .transpose()
            .map_err(Into::into)
    }

    pub fn created_from(&self) -> Option<Timestamp> {
        self.from.map(Timestamp::from_datetime)
    }

    pub fn created_to(&self) -> Option<Timestamp> {
        self.to.map(Timestamp::from_datetime)
    }

    pub fn check_range(&self) -> Result<(), ApiError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(ApiError::validation("`from` must not be after `to`"))
            }
            _ => Ok(()),
        }
    }
}
