//! Shared type definitions.

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::{LicenseType, PaymentStatus, PayoutStatus, ProductStatus, SellerStatus};
