//! PaymentStatisticsHandler - Admin query for payment totals.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::PaymentError;
use crate::ports::{PaymentRepository, PaymentStatistics};

#[derive(Debug, Clone, Default)]
pub struct PaymentStatisticsQuery {
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct PaymentStatisticsResult {
    pub statistics: PaymentStatistics,
}

pub struct PaymentStatisticsHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentStatisticsHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn handle(
        &self,
        query: PaymentStatisticsQuery,
    ) -> Result<PaymentStatisticsResult, PaymentError> {
        let statistics = self
            .payments
            .statistics(query.created_from, query.created_to)
            .await?;
        Ok(PaymentStatisticsResult { statistics })
    }
}
