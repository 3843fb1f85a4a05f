//! In-memory adapters.
//!
//! Used by the test suite and for running the service without a database.

mod catalog;
mod store;
mod webhook_events;

pub use catalog::InMemoryCatalog;
pub use store::InMemoryStore;
pub use webhook_events::InMemoryWebhookEventRepository;
