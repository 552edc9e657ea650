//! Outbound service integrations.

pub mod email;
pub mod storage;

pub use email::EmailService;
pub use storage::StorageService;
