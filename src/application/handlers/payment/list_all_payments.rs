//! ListAllPaymentsHandler - Admin query over every payment.

use std::sync::Arc;

use crate::domain::payment::PaymentError;
use crate::ports::{PaymentFilter, PaymentPage, PaymentRepository};

use super::payment_history::MAX_PAGE_SIZE;

#[derive(Debug, Clone, Default)]
pub struct ListAllPaymentsQuery {
    pub filter: PaymentFilter,
}

#[derive(Debug, Clone)]
pub struct ListAllPaymentsResult {
    pub page: PaymentPage,
}

pub struct ListAllPaymentsHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl ListAllPaymentsHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn handle(
        &self,
        query: ListAllPaymentsQuery,
    ) -> Result<ListAllPaymentsResult, PaymentError> {
        let mut filter = query.filter;
        filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
        let page = self.payments.list(&filter).await?;
        Ok(ListAllPaymentsResult { page })
    }
}
