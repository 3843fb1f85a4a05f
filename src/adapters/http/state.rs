//! Shared application state for the HTTP layer.

use std::sync::Arc;

use crate::application::handlers::cart::{
    AddMovieToCartHandler, ClearCartHandler, GetCartHandler, GetUserCartHandler,
    RemoveMovieFromCartHandler,
};
use crate::application::handlers::order::{
    CancelOrderHandler, CreateOrderFromCartHandler, GetOrderHandler, ListAllOrdersHandler,
    ListOrdersHandler,
};
use crate::application::handlers::payment::{
    CheckoutSettings, GetPaymentHandler, HandlePaymentWebhookHandler, InitiatePaymentHandler,
    ListAllPaymentsHandler, PaymentHistoryHandler, PaymentStatisticsHandler, RefundPaymentHandler,
    RefundSettings,
};
use crate::ports::{
    CartRepository, CatalogLookup, OrderRepository, PaymentGateway, PaymentRepository,
};

/// Dependencies shared by every request.
///
/// Cloned per request; everything inside is behind an `Arc`. Handlers are
/// built on demand from it.
#[derive(Clone)]
pub struct AppState {
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub catalog: Arc<dyn CatalogLookup>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub checkout: CheckoutSettings,
    pub refunds: RefundSettings,
    /// Holds the signing secret, so it is built once at startup.
    pub webhooks: Arc<HandlePaymentWebhookHandler>,
}

impl AppState {
    // Cart

    pub fn get_cart_handler(&self) -> GetCartHandler {
        GetCartHandler::new(self.carts.clone(), self.catalog.clone())
    }

    pub fn add_movie_handler(&self) -> AddMovieToCartHandler {
        AddMovieToCartHandler::new(self.carts.clone(), self.orders.clone(), self.catalog.clone())
    }

    pub fn remove_movie_handler(&self) -> RemoveMovieFromCartHandler {
        RemoveMovieFromCartHandler::new(self.carts.clone())
    }

    pub fn clear_cart_handler(&self) -> ClearCartHandler {
        ClearCartHandler::new(self.carts.clone())
    }

    pub fn get_user_cart_handler(&self) -> GetUserCartHandler {
        GetUserCartHandler::new(self.carts.clone())
    }

    // Orders

    pub fn checkout_handler(&self) -> CreateOrderFromCartHandler {
        CreateOrderFromCartHandler::new(
            self.carts.clone(),
            self.orders.clone(),
            self.catalog.clone(),
        )
    }

    pub fn cancel_order_handler(&self) -> CancelOrderHandler {
        CancelOrderHandler::new(self.orders.clone())
    }

    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.orders.clone())
    }

    pub fn list_orders_handler(&self) -> ListOrdersHandler {
        ListOrdersHandler::new(self.orders.clone())
    }

    pub fn list_all_orders_handler(&self) -> ListAllOrdersHandler {
        ListAllOrdersHandler::new(self.orders.clone())
    }

    // Payments

    pub fn initiate_payment_handler(&self) -> InitiatePaymentHandler {
        InitiatePaymentHandler::new(
            self.orders.clone(),
            self.payments.clone(),
            self.catalog.clone(),
            self.gateway.clone(),
            self.checkout.clone(),
        )
    }

    pub fn refund_handler(&self) -> RefundPaymentHandler {
        RefundPaymentHandler::new(
            self.payments.clone(),
            self.gateway.clone(),
            self.refunds.clone(),
        )
    }

    pub fn get_payment_handler(&self) -> GetPaymentHandler {
        GetPaymentHandler::new(self.payments.clone())
    }

    pub fn payment_history_handler(&self) -> PaymentHistoryHandler {
        PaymentHistoryHandler::new(self.payments.clone())
    }

    pub fn list_all_payments_handler(&self) -> ListAllPaymentsHandler {
        ListAllPaymentsHandler::new(self.payments.clone())
    }

    pub fn statistics_handler(&self) -> PaymentStatisticsHandler {
        PaymentStatisticsHandler::new(self.payments.clone())
    }
}
