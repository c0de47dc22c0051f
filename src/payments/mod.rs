pub mod capitalizing;
pub mod direct;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PledgeError, Result};
use crate::pledge::Pledge;
use crate::types::{PaymentId, PledgeId, PledgeStatus};

pub use capitalizing::CapitalizingPayment;
pub use direct::DirectPayment;

pub const PAYMENT_TYPE_FULL: &str = "FULL";
pub const PAYMENT_TYPE_PARTIAL: &str = "PARTIAL";

/// immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub pledge_id: PledgeId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub payment_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        pledge_id: PledgeId,
        amount: Money,
        payment_type: String,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pledge_id,
            amount,
            payment_date: now,
            payment_type,
            notes,
            created_at: now,
        }
    }
}

/// incoming payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub payment_type: String,
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Money, payment_type: impl Into<String>) -> Self {
        Self {
            amount,
            payment_type: payment_type.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// outcome of applying a payment to a pledge, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentApplication {
    pub new_principal: Money,
    pub new_status: PledgeStatus,
    pub payment: Payment,
    /// interest folded into principal before the payment was subtracted
    pub interest_capitalized: Money,
    /// principal plus a fresh accrual window opened at the payment date
    pub total_amount_due: Money,
    /// every payment on the pledge including this one
    pub total_paid: Money,
}

/// which payment semantics an entry point uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStrategy {
    /// capitalize accrued interest, then subtract; overpayment clamps to zero
    Capitalizing,
    /// subtract from principal only; overpayment is rejected
    Direct,
}

impl PaymentStrategy {
    pub fn apply(
        &self,
        pledge: &Pledge,
        request: &PaymentRequest,
        history: &[Payment],
        now: DateTime<Utc>,
    ) -> Result<PaymentApplication> {
        match self {
            PaymentStrategy::Capitalizing => CapitalizingPayment.apply(pledge, request, history, now),
            PaymentStrategy::Direct => DirectPayment.apply(pledge, request, history, now),
        }
    }
}

/// reject zero and negative amounts
pub fn validate_amount(amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(PledgeError::InvalidPaymentAmount { amount });
    }
    Ok(())
}

/// date of the most recent payment, if any
pub fn latest_payment_date(history: &[Payment]) -> Option<DateTime<Utc>> {
    history.iter().map(|p| p.payment_date).max()
}

/// status after a capitalizing payment. an exhausted principal wins over
/// everything else.
pub fn status_after_payment(
    principal: Money,
    remaining_amount: Money,
    total_paid: Money,
) -> PledgeStatus {
    if principal <= Money::ZERO || remaining_amount <= Money::ZERO {
        PledgeStatus::Closed
    } else if total_paid > Money::ZERO {
        PledgeStatus::PartiallyPaid
    } else {
        PledgeStatus::Active
    }
}
