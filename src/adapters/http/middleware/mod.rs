//! HTTP middleware and extractors.

pub mod auth;

pub use auth::{AdminUser, CurrentUser, USER_ID_HEADER, USER_ROLE_HEADER};
