use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

/// record kinds that can be looked up by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Pledge,
    Payment,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Customer => "customer",
            Entity::Pledge => "pledge",
            Entity::Payment => "payment",
        };
        f.write_str(name)
    }
}

/// coarse classification callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidInput,
    MissingPrerequisite,
    Storage,
}

#[derive(Error, Debug)]
pub enum PledgeError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: Entity,
        id: Uuid,
    },

    #[error("pledge {id} is already closed")]
    PledgeClosed {
        id: Uuid,
    },

    #[error("payment exceeds outstanding principal: principal {principal}, requested {requested}")]
    PaymentExceedsPrincipal {
        principal: Money,
        requested: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("deadline {deadline} must be after creation time {created_at}")]
    InvalidDeadline {
        created_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },

    #[error("invalid pledge status: {value}")]
    InvalidStatus {
        value: String,
    },

    #[error("invalid {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("{field} is not set")]
    MissingPrerequisite {
        field: &'static str,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

impl PledgeError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        PledgeError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PledgeError::NotFound { .. } => ErrorKind::NotFound,
            PledgeError::PledgeClosed { .. }
            | PledgeError::PaymentExceedsPrincipal { .. } => ErrorKind::InvalidState,
            PledgeError::InvalidPaymentAmount { .. }
            | PledgeError::InvalidDeadline { .. }
            | PledgeError::InvalidStatus { .. }
            | PledgeError::InvalidField { .. }
            | PledgeError::InvalidConfiguration { .. } => ErrorKind::InvalidInput,
            PledgeError::MissingPrerequisite { .. } => ErrorKind::MissingPrerequisite,
            PledgeError::Storage { .. } => ErrorKind::Storage,
        }
    }
}

impl From<serde_json::Error> for PledgeError {
    fn from(err: serde_json::Error) -> Self {
        PledgeError::InvalidConfiguration {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PledgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(PledgeError::not_found(Entity::Pledge, id).kind(), ErrorKind::NotFound);
        assert_eq!(PledgeError::PledgeClosed { id }.kind(), ErrorKind::InvalidState);
        assert_eq!(
            PledgeError::InvalidPaymentAmount { amount: Money::ZERO }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            PledgeError::MissingPrerequisite { field: "principal" }.kind(),
            ErrorKind::MissingPrerequisite
        );
    }

    #[test]
    fn test_messages() {
        let id = Uuid::nil();
        assert_eq!(
            PledgeError::not_found(Entity::Customer, id).to_string(),
            format!("customer not found: {}", id)
        );
        assert_eq!(
            PledgeError::MissingPrerequisite { field: "interest rate" }.to_string(),
            "interest rate is not set"
        );
    }
}
