//! Domain enums for directory entities.
//!
//! Enum values are stored as `TEXT` in PostgreSQL and round-tripped through
//! `Display`/`FromStr`, so the store layer does not depend on database-side
//! enum types.

use serde::{Deserialize, Serialize};

/// Role of a directory user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Business owner offering services through the directory.
    #[default]
    Provider,
    /// Regular customer account (also used for imported reviewers).
    Customer,
    /// Platform administrator.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider => write!(f, "PROVIDER"),
            Self::Customer => write!(f, "CUSTOMER"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROVIDER" => Ok(Self::Provider),
            "CUSTOMER" => Ok(Self::Customer),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Review state of a business application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Waiting in the admin review queue.
    #[default]
    Pending,
    /// Approved; the applicant can operate as a provider.
    Approved,
    /// Rejected by an admin reviewer.
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(format!("invalid application status: {s}")),
        }
    }
}

/// Subscription plan tier for providers.
///
/// `BasicFree` is the zero-cost default assigned on import; paid tiers are
/// managed by the subscription flows outside this repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    /// Free listing: no bookings, no products, default search placement.
    #[default]
    BasicFree,
    /// Entry booking plan.
    BookingBasic,
    /// Product listing plan.
    Products,
    /// Product listing plan with promotional placement.
    ProductsPremium,
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BasicFree => write!(f, "BASIC_FREE"),
            Self::BookingBasic => write!(f, "BOOKING_BASIC"),
            Self::Products => write!(f, "PRODUCTS"),
            Self::ProductsPremium => write!(f, "PRODUCTS_PREMIUM"),
        }
    }
}

impl std::str::FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BASIC_FREE" => Ok(Self::BasicFree),
            "BOOKING_BASIC" => Ok(Self::BookingBasic),
            "PRODUCTS" => Ok(Self::Products),
            "PRODUCTS_PREMIUM" => Ok(Self::ProductsPremium),
            _ => Err(format!("invalid plan type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Provider, UserRole::Customer, UserRole::Admin] {
            assert_eq!(UserRole::from_str(&role.to_string()), Ok(role));
        }
    }

    #[test]
    fn test_user_role_rejects_unknown() {
        assert!(UserRole::from_str("MANAGER").is_err());
    }

    #[test]
    fn test_default_role_is_provider() {
        assert_eq!(UserRole::default(), UserRole::Provider);
    }

    #[test]
    fn test_application_status_round_trip() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::from_str(&status.to_string()), Ok(status));
        }
    }

    #[test]
    fn test_plan_type_serde_names() {
        let json = serde_json::to_string(&PlanType::BasicFree).expect("serialize");
        assert_eq!(json, "\"BASIC_FREE\"");
    }
}
