//! Session-related types.
//!
//! Types stored in the session for authentication and receipt access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pixelfair_core::{Email, OrderId, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session-stored proof that a receipt's email challenge was passed.
///
/// Grants access to one order's receipt and downloads. The expiry is embedded
/// in the value so a long-lived session cookie cannot stretch the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptGrant {
    /// Order the grant covers.
    pub order_id: OrderId,
    /// Receipt token the grant was issued against.
    pub token: String,
    /// Hard expiry of the grant.
    pub expires_at: DateTime<Utc>,
}

impl ReceiptGrant {
    /// Whether this grant still covers the given order.
    #[must_use]
    pub fn is_valid_for(&self, order_id: OrderId, now: DateTime<Utc>) -> bool {
        self.order_id == order_id && self.expires_at > now
    }
}

/// Session keys for authentication and receipt data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the active receipt access grant.
    pub const RECEIPT_GRANT: &str = "receipt_grant";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_receipt_grant_scoped_to_order() {
        let now = Utc::now();
        let grant = ReceiptGrant {
            order_id: OrderId::new(5),
            token: "tok".to_string(),
            expires_at: now + Duration::minutes(15),
        };

        assert!(grant.is_valid_for(OrderId::new(5), now));
        assert!(!grant.is_valid_for(OrderId::new(6), now));
    }

    #[test]
    fn test_receipt_grant_expires() {
        let now = Utc::now();
        let grant = ReceiptGrant {
            order_id: OrderId::new(5),
            token: "tok".to_string(),
            expires_at: now + Duration::minutes(15),
        };

        assert!(!grant.is_valid_for(OrderId::new(5), now + Duration::minutes(16)));
    }
}
