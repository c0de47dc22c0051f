use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{PledgeError, Result};
use crate::interest::interest_to_date;
use crate::types::{Collateral, CustomerId, PhotoRefs, PledgeId, PledgeStatus};

/// highest monthly rate the validity predicate accepts
pub const MAX_MONTHLY_RATE_PERCENT: u32 = 36;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;
const MAX_ADDRESS_LEN: usize = 500;

/// customer owning one or more pledges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// intake payload for a new customer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerRequest {
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("name", "name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(invalid("name", "name too long"));
        }

        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            let digits_only = phone.chars().all(|c| c.is_ascii_digit());
            if !digits_only || !(10..=15).contains(&phone.len()) {
                return Err(invalid("phone", "invalid phone number"));
            }
        }

        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if email.len() > MAX_EMAIL_LEN {
                return Err(invalid("email", "email too long"));
            }
            let well_formed = match email.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty()
                        && !domain.is_empty()
                        && !domain.contains('@')
                        && !email.chars().any(char::is_whitespace)
                }
                None => false,
            };
            if !well_formed {
                return Err(invalid("email", "invalid email format"));
            }
        }

        if let Some(address) = &self.address {
            if address.chars().count() > MAX_ADDRESS_LEN {
                return Err(invalid("address", "address too long"));
            }
        }

        Ok(())
    }

    pub fn into_customer(self, now: DateTime<Utc>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            phone: self.phone.filter(|p| !p.is_empty()),
            email: self.email.filter(|e| !e.is_empty()),
            address: self.address,
            created_at: now,
            is_active: true,
        }
    }
}

fn invalid(field: &'static str, message: &str) -> PledgeError {
    PledgeError::InvalidField {
        field,
        message: message.to_string(),
    }
}

/// create and edit payload for a pledge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PledgeRequest {
    pub customer_id: CustomerId,
    pub title: Option<String>,
    pub description: Option<String>,
    /// loan amount on create; on edit only a positive value replaces the principal
    pub amount: Option<Money>,
    /// monthly percent; absent or non-positive means "use default" on create, "keep" on edit
    pub interest_rate: Option<Rate>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: PledgeStatus,
    #[serde(default)]
    pub collateral: Collateral,
    #[serde(default)]
    pub photos: PhotoRefs,
}

impl PledgeRequest {
    pub fn new(customer_id: CustomerId, amount: Money) -> Self {
        Self {
            customer_id,
            title: None,
            description: None,
            amount: Some(amount),
            interest_rate: None,
            deadline: None,
            status: PledgeStatus::Active,
            collateral: Collateral::default(),
            photos: PhotoRefs::default(),
        }
    }

    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    /// caller-supplied rate, if usable
    pub fn positive_rate(&self) -> Option<Rate> {
        self.interest_rate.filter(|r| r.is_positive())
    }

    /// caller-supplied amount, if usable as a principal override
    pub fn positive_amount(&self) -> Option<Money> {
        self.amount.filter(|a| a.is_positive())
    }
}

/// a collateralized loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pledge {
    pub id: PledgeId,
    pub customer_id: CustomerId,
    pub title: Option<String>,
    pub description: Option<String>,
    /// current outstanding base, re-based by every capitalization and payment
    pub principal: Option<Money>,
    pub monthly_rate: Option<Rate>,
    pub created_at: DateTime<Utc>,
    /// instant up to which interest has been folded into principal
    pub last_interest_accrued_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: PledgeStatus,
    pub collateral: Collateral,
    pub photos: PhotoRefs,
}

impl Pledge {
    /// originate a pledge from a request and a resolved rate
    pub fn originate(request: PledgeRequest, rate: Rate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            title: request.title,
            description: request.description,
            principal: request.amount,
            monthly_rate: Some(rate),
            created_at: now,
            last_interest_accrued_at: Some(now),
            deadline: request.deadline,
            status: request.status,
            collateral: request.collateral,
            photos: request.photos,
        }
    }

    /// principal with absent treated as zero
    pub fn principal_or_zero(&self) -> Money {
        self.principal.unwrap_or(Money::ZERO)
    }

    /// start of the window not yet folded into principal by a rate change
    pub fn accrual_anchor(&self) -> DateTime<Utc> {
        self.last_interest_accrued_at.unwrap_or(self.created_at)
    }

    /// reject a deadline that does not fall after origination
    pub fn check_deadline(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if deadline <= self.created_at => Err(PledgeError::InvalidDeadline {
                created_at: self.created_at,
                deadline,
            }),
            _ => Ok(()),
        }
    }

    pub fn has_valid_amount(&self) -> bool {
        self.principal.map_or(false, |p| p.is_positive())
    }

    /// advisory only: mutations do not enforce it
    pub fn has_valid_rate(&self) -> bool {
        self.monthly_rate.map_or(false, |r| {
            r.is_positive() && r.as_percent() <= Decimal::from(MAX_MONTHLY_RATE_PERCENT)
        })
    }

    pub fn has_valid_dates(&self) -> bool {
        self.deadline.map_or(false, |d| d > self.created_at)
    }

    /// principal × monthly fraction / 30; both must be set
    pub fn daily_interest(&self) -> Result<Money> {
        let principal = self
            .principal
            .ok_or(PledgeError::MissingPrerequisite { field: "principal" })?;
        let rate = self.monthly_rate.ok_or(PledgeError::MissingPrerequisite {
            field: "interest rate",
        })?;
        Ok(Money::from_decimal(principal.as_decimal() * rate.daily_fraction()))
    }

    /// tiered interest since origination on the current principal
    pub fn total_interest_to_date(&self, now: DateTime<Utc>) -> Result<Money> {
        interest_to_date(self.principal, self.monthly_rate, Some(self.created_at), now)
    }

    pub fn total_amount(&self, now: DateTime<Utc>) -> Result<Money> {
        let interest = self.total_interest_to_date(now)?;
        Ok(self.principal_or_zero() + interest)
    }

    /// overwrite the editable fields verbatim from a request
    pub(crate) fn apply_edits(&mut self, request: &PledgeRequest) {
        self.title = request.title.clone();
        self.description = request.description.clone();
        self.deadline = request.deadline;
        self.status = request.status;
        self.collateral = request.collateral.clone();
        self.photos = request.photos.clone();
    }
}
