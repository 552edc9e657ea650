//! Domain models shared across routes.

pub mod session;

pub use session::{CurrentUser, ReceiptGrant, keys as session_keys};
