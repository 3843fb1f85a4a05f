//! PaymentHistoryHandler - Query handler for the caller's payments.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::payment::PaymentError;
use crate::ports::{PaymentPage, PaymentRepository};

/// Largest page any payment listing returns.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct PaymentHistoryQuery {
    pub user_id: UserId,
    pub skip: u32,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct PaymentHistoryResult {
    pub page: PaymentPage,
}

/// Newest first, paginated, with the total count.
pub struct PaymentHistoryHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentHistoryHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn handle(
        &self,
        query: PaymentHistoryQuery,
    ) -> Result<PaymentHistoryResult, PaymentError> {
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let page = self
            .payments
            .list_for_user(&query.user_id, query.skip, limit)
            .await?;
        Ok(PaymentHistoryResult { page })
    }
}
