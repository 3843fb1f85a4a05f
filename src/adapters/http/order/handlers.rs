//! HTTP handlers for order endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::order::{
    CancelOrderCommand, CreateOrderFromCartCommand, GetOrderQuery, ListAllOrdersQuery,
    ListOrdersQuery,
};
use crate::application::handlers::payment::InitiatePaymentCommand;
use crate::domain::order::OrderStatus;
use crate::ports::OrderFilter;

use super::super::error::ApiError;
use super::super::middleware::{AdminUser, CurrentUser};
use super::super::params::{self, AdminListParams};
use super::super::state::AppState;
use super::dto::{
    CheckoutResponse, ExcludedLineResponse, OrderListResponse, OrderResponse, PayOrderResponse,
};

/// POST /api/orders - Convert the cart into a pending order.
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .checkout_handler()
        .handle(CreateOrderFromCartCommand {
            user_id: actor.user_id,
        })
        .await?;

    let response = CheckoutResponse {
        order: OrderResponse::from(&result.order),
        excluded: result.excluded.iter().map(ExcludedLineResponse::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/orders - The caller's orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .list_orders_handler()
        .handle(ListOrdersQuery {
            user_id: actor.user_id,
        })
        .await?;

    Ok(Json(OrderListResponse::from(result.orders.as_slice())))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = params::order_id(&id)?;
    let result = state
        .get_order_handler()
        .handle(GetOrderQuery { order_id, actor })
        .await?;

    Ok(Json(OrderResponse::from(&result.order)))
}

/// POST /api/orders/:id/cancel - Cancel a pending order.
pub async fn cancel_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = params::order_id(&id)?;
    let result = state
        .cancel_order_handler()
        .handle(CancelOrderCommand {
            order_id,
            user_id: actor.user_id,
        })
        .await?;

    Ok(Json(OrderResponse::from(&result.order)))
}

/// POST /api/orders/:id/pay - Start a payment attempt for a pending order.
pub async fn pay_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = params::order_id(&id)?;
    let result = state
        .initiate_payment_handler()
        .handle(InitiatePaymentCommand {
            order_id,
            user_id: actor.user_id,
        })
        .await?;

    let response = PayOrderResponse {
        payment_id: result.payment.id.to_string(),
        amount: result.payment.amount,
        checkout_url: result.checkout_url,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/orders/admin - Every order, filtered (admin).
pub async fn list_all_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, ApiError> {
    params.check_range()?;
    let filter = OrderFilter {
        user_id: params.user_id()?,
        status: params.status::<OrderStatus>()?,
        created_from: params.created_from(),
        created_to: params.created_to(),
    };

    let result = state
        .list_all_orders_handler()
        .handle(ListAllOrdersQuery { filter })
        .await?;

    Ok(Json(OrderListResponse::from(result.orders.as_slice())))
}
