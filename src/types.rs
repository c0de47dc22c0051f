use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::PledgeError;

/// unique identifier for a pledge
pub type PledgeId = Uuid;

/// unique identifier for a customer
pub type CustomerId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// pledge status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PledgeStatus {
    /// loan outstanding, nothing paid yet
    Active,
    /// at least one payment received, balance remains
    PartiallyPaid,
    /// marked complete by an operator
    Completed,
    /// customer failed to redeem the item
    Defaulted,
    /// balance exhausted; terminal on the payment path
    Closed,
}

impl PledgeStatus {
    pub const ALL: [PledgeStatus; 5] = [
        PledgeStatus::Active,
        PledgeStatus::PartiallyPaid,
        PledgeStatus::Completed,
        PledgeStatus::Defaulted,
        PledgeStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PledgeStatus::Active => "ACTIVE",
            PledgeStatus::PartiallyPaid => "PARTIALLY_PAID",
            PledgeStatus::Completed => "COMPLETED",
            PledgeStatus::Defaulted => "DEFAULTED",
            PledgeStatus::Closed => "CLOSED",
        }
    }

    /// check whether a raw status string names one of the five statuses
    pub fn is_valid(value: &str) -> bool {
        value.parse::<PledgeStatus>().is_ok()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PledgeStatus::Closed)
    }
}

impl fmt::Display for PledgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PledgeStatus {
    type Err = PledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PledgeStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PledgeError::InvalidStatus {
                value: s.to_string(),
            })
    }
}

/// the item held against the loan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Collateral {
    pub item_type: Option<String>,
    /// grams
    pub weight: Option<Decimal>,
    pub purity: Option<String>,
    pub notes: Option<String>,
}

/// photo references, opaque urls
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhotoRefs {
    pub customer_photo: Option<String>,
    pub item_photo: Option<String>,
    pub receipt_photo: Option<String>,
}

impl PhotoRefs {
    /// references that are present and non-blank
    pub fn present(&self) -> Vec<&str> {
        [&self.customer_photo, &self.item_photo, &self.receipt_photo]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect()
    }
}
