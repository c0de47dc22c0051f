//! read-side views of pledges
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::accrued_interest;
use crate::pledge::Pledge;
use crate::types::{Collateral, CustomerId, PhotoRefs, PledgeId, PledgeStatus};

/// serializable view of a pledge with a live remaining figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PledgeView {
    pub id: PledgeId,
    pub customer_id: CustomerId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub interest_rate: Option<Rate>,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: PledgeStatus,
    pub collateral: Collateral,
    pub photos: PhotoRefs,
    /// principal plus tiered interest as of the read; never stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_amount: Option<Money>,
}

impl PledgeView {
    /// `last_payment_date` is the result of looking up the newest payment;
    /// a failed lookup leaves `remaining_amount` empty instead of failing the read
    pub fn project(
        pledge: &Pledge,
        last_payment_date: Result<Option<DateTime<Utc>>>,
        now: DateTime<Utc>,
    ) -> Self {
        let remaining_amount = match last_payment_date {
            Ok(last) => {
                let accrual_start = last.unwrap_or(pledge.created_at);
                let interest =
                    accrued_interest(pledge.principal, pledge.monthly_rate, accrual_start, now);
                Some(pledge.principal_or_zero() + interest)
            }
            Err(err) => {
                tracing::debug!(pledge_id = %pledge.id, error = %err, "remaining amount omitted");
                None
            }
        };

        Self {
            id: pledge.id,
            customer_id: pledge.customer_id,
            title: pledge.title.clone(),
            description: pledge.description.clone(),
            amount: pledge.principal,
            interest_rate: pledge.monthly_rate,
            created_at: pledge.created_at,
            deadline: pledge.deadline,
            status: pledge.status,
            collateral: pledge.collateral.clone(),
            photos: pledge.photos.clone(),
            remaining_amount,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
