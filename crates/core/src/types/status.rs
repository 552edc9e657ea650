//! Status enums for marketplace entities.
//!
//! Each enum maps 1:1 onto a Postgres enum type (see the server migrations)
//! and serializes as `snake_case` on the wire.

use serde::{Deserialize, Serialize};

/// Payment status of an order.
///
/// Orders are created at payment capture time; a successful capture records
/// the order as `completed` directly. `pending`/`failed` exist for orders
/// created through the asynchronous webhook fulfillment path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Product listing lifecycle.
///
/// `draft → published → archived`. A product that has been ordered is never
/// hard-deleted; it is archived instead so order history stays intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Seller account status.
///
/// Gates whether payout requests may be created. Transitions are admin- or
/// system-triggered only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "seller_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SellerStatus {
    #[default]
    Active,
    PayoutsLocked,
    Suspended,
}

/// Payout request lifecycle.
///
/// `pending → processing → completed`, or `pending|processing → held`, or
/// `pending|processing → failed`. A transition to `failed` refunds the
/// requested amount to the seller's available balance (performed by the
/// `fail_payout` backend procedure, not by this layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payout_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Held,
    Failed,
}

/// License attached to a purchased item, affecting price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "license_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    #[default]
    Personal,
    Commercial,
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Held => "held",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "held" => Ok(Self::Held),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payout status: {s}")),
        }
    }
}

impl std::fmt::Display for SellerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::PayoutsLocked => "payouts_locked",
            Self::Suspended => "suspended",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SellerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "payouts_locked" => Ok(Self::PayoutsLocked),
            "suspended" => Ok(Self::Suspended),
            _ => Err(format!("invalid seller status: {s}")),
        }
    }
}

impl std::str::FromStr for LicenseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "commercial" => Ok(Self::Commercial),
            _ => Err(format!("invalid license type: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_status_parses_all_five() {
        for s in ["pending", "processing", "completed", "held", "failed"] {
            let status: PayoutStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
    }

    #[test]
    fn test_payout_status_rejects_unknown() {
        assert!("refunded".parse::<PayoutStatus>().is_err());
        assert!("PENDING".parse::<PayoutStatus>().is_err());
        assert!("".parse::<PayoutStatus>().is_err());
    }

    #[test]
    fn test_seller_status_roundtrip() {
        for s in ["active", "payouts_locked", "suspended"] {
            let status: SellerStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("banned".parse::<SellerStatus>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&SellerStatus::PayoutsLocked).unwrap(),
            "\"payouts_locked\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"completed\""
        );
        let license: LicenseType = serde_json::from_str("\"commercial\"").unwrap();
        assert_eq!(license, LicenseType::Commercial);
    }
}
