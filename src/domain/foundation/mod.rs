//! Foundation module - Shared domain primitives.
//!
//! Value objects, identifiers, the state machine trait and the error
//! vocabulary shared by the cart, order and payment modules.

mod errors;
mod ids;
mod money;
mod ownership;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CartId, MovieId, OrderId, OrderLineId, PaymentId, PaymentLineId, UserId};
pub use money::{Money, CURRENCY_SCALE};
pub use ownership::{Actor, OwnedByUser, Role};
pub use state_machine::{InvalidTransition, StateMachine};
pub use timestamp::Timestamp;
