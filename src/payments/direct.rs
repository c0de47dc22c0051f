use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::{PledgeError, Result};
use crate::payments::{
    validate_amount, Payment, PaymentApplication, PaymentRequest, PAYMENT_TYPE_FULL,
    PAYMENT_TYPE_PARTIAL,
};
use crate::pledge::Pledge;
use crate::types::PledgeStatus;

/// straight subtraction from the stored principal with no interest step
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPayment;

impl DirectPayment {
    /// the payment type on `request` is ignored; FULL or PARTIAL is derived
    /// from the resulting principal
    pub fn apply(
        &self,
        pledge: &Pledge,
        request: &PaymentRequest,
        history: &[Payment],
        now: DateTime<Utc>,
    ) -> Result<PaymentApplication> {
        validate_amount(request.amount)?;

        let principal = pledge.principal_or_zero();
        let new_principal = principal - request.amount;
        if new_principal.is_negative() {
            return Err(PledgeError::PaymentExceedsPrincipal {
                principal,
                requested: request.amount,
            });
        }

        let payment_type = if new_principal.is_zero() {
            PAYMENT_TYPE_FULL
        } else {
            PAYMENT_TYPE_PARTIAL
        };
        let payment = Payment::new(
            pledge.id,
            request.amount,
            payment_type.to_string(),
            request.notes.clone(),
            now,
        );

        let new_status = if new_principal <= Money::ZERO {
            PledgeStatus::Closed
        } else {
            pledge.status
        };

        Ok(PaymentApplication {
            new_principal,
            new_status,
            payment,
            interest_capitalized: Money::ZERO,
            total_amount_due: new_principal,
            total_paid: history.iter().map(|p| p.amount).sum::<Money>() + request.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::errors::ErrorKind;
    use crate::payments::PaymentStrategy;
    use crate::pledge::PledgeRequest;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn pledge(principal: i64) -> Pledge {
        let request = PledgeRequest::new(Uuid::new_v4(), Money::from_major(principal));
        Pledge::originate(request, Rate::from_percent(dec!(2)), t0())
    }

    #[test]
    fn test_partial_direct_payment() {
        let p = pledge(1_000);
        let request = PaymentRequest::new(Money::from_major(400), "ignored").with_notes("cash");

        let result = DirectPayment
            .apply(&p, &request, &[], t0() + Duration::days(90))
            .unwrap();

        // no interest even after 90 days
        assert_eq!(result.new_principal, Money::from_major(600));
        assert_eq!(result.interest_capitalized, Money::ZERO);
        assert_eq!(result.payment.payment_type, PAYMENT_TYPE_PARTIAL);
        assert_eq!(result.payment.notes.as_deref(), Some("cash"));
        assert_eq!(result.new_status, PledgeStatus::Active);
    }

    #[test]
    fn test_full_direct_payment_closes() {
        let p = pledge(1_000);
        let request = PaymentRequest::new(Money::from_major(1_000), "ignored");

        let result = DirectPayment.apply(&p, &request, &[], t0()).unwrap();

        assert_eq!(result.new_principal, Money::ZERO);
        assert_eq!(result.payment.payment_type, PAYMENT_TYPE_FULL);
        assert_eq!(result.new_status, PledgeStatus::Closed);
    }

    #[test]
    fn test_overpayment_rejected() {
        let p = pledge(1_000);
        let request = PaymentRequest::new(Money::from_major(1_500), "ignored");

        let err = DirectPayment.apply(&p, &request, &[], t0()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(matches!(err, PledgeError::PaymentExceedsPrincipal { .. }));
    }

    #[test]
    fn test_strategies_differ() {
        let p = pledge(1_000);
        let request = PaymentRequest::new(Money::from_major(100), "PARTIAL");
        let now = t0() + Duration::days(10);

        let capitalizing = PaymentStrategy::Capitalizing.apply(&p, &request, &[], now).unwrap();
        let direct = PaymentStrategy::Direct.apply(&p, &request, &[], now).unwrap();

        assert_eq!(capitalizing.new_principal, Money::from_major(920));
        assert_eq!(direct.new_principal, Money::from_major(900));
    }
}
