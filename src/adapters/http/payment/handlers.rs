//! HTTP handlers for payment endpoints and the Stripe webhook.

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::payment::{
    GetPaymentQuery, HandlePaymentWebhookCommand, ListAllPaymentsQuery, PaymentHistoryQuery,
    PaymentStatisticsQuery, RefundPaymentCommand, MAX_PAGE_SIZE,
};
use crate::domain::payment::{PaymentStatus, WebhookError};
use crate::ports::PaymentFilter;

use super::super::error::ApiError;
use super::super::middleware::{AdminUser, CurrentUser};
use super::super::params::{self, AdminListParams};
use super::super::state::AppState;
use super::dto::{
    PageParams, PaymentPageResponse, PaymentResponse, RefundResponse, WebhookAckResponse,
    DEFAULT_PAGE_SIZE,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// GET /api/payments - Caller's payment history, newest first.
pub async fn payment_history(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .payment_history_handler()
        .handle(PaymentHistoryQuery {
            user_id: actor.user_id,
            skip: page.skip,
            limit: page.limit,
        })
        .await?;

    Ok(Json(PaymentPageResponse::new(
        &result.page,
        page.skip,
        page.limit.clamp(1, MAX_PAGE_SIZE),
    )))
}

/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment_id = params::payment_id(&id)?;
    let result = state
        .get_payment_handler()
        .handle(GetPaymentQuery { payment_id, actor })
        .await?;

    Ok(Json(PaymentResponse::from(&result.payment)))
}

/// POST /api/payments/:id/refund - Full refund through Stripe (admin).
pub async fn refund_payment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment_id = params::payment_id(&id)?;
    tracing::info!(payment_id = %payment_id, admin = %admin.user_id, "Refund requested");

    let result = state
        .refund_handler()
        .handle(RefundPaymentCommand { payment_id })
        .await?;

    Ok(Json(RefundResponse {
        payment: PaymentResponse::from(&result.payment),
        refund_id: result.refund.id,
        refund_status: result.refund.status,
    }))
}

/// GET /api/payments/admin - Every payment, filtered and paged (admin).
pub async fn list_all_payments(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, ApiError> {
    params.check_range()?;
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let filter = PaymentFilter {
        user_id: params.user_id()?,
        status: params.status::<PaymentStatus>()?,
        created_from: params.created_from(),
        created_to: params.created_to(),
        skip,
        limit,
    };

    let result = state
        .list_all_payments_handler()
        .handle(ListAllPaymentsQuery { filter })
        .await?;

    Ok(Json(PaymentPageResponse::new(
        &result.page,
        skip,
        limit.clamp(1, MAX_PAGE_SIZE),
    )))
}

/// GET /api/payments/admin/statistics - Totals over an optional date range (admin).
pub async fn payment_statistics(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, ApiError> {
    params.check_range()?;
    let result = state
        .statistics_handler()
        .handle(PaymentStatisticsQuery {
            created_from: params.created_from(),
            created_to: params.created_to(),
        })
        .await?;

    Ok(Json(result.statistics))
}

/// POST /api/webhooks/stripe
///
/// No user identity; the signature over the raw body authenticates the call.
/// The status code tells Stripe whether to deliver again.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::InvalidSignature)?;

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = state.webhooks.handle(cmd).await?;
    Ok((StatusCode::OK, Json(WebhookAckResponse::from(&result))))
}
