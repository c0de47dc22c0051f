use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::{PledgeError, Result};
use crate::interest::accrued_interest;
use crate::payments::{
    latest_payment_date, status_after_payment, validate_amount, Payment, PaymentApplication,
    PaymentRequest,
};
use crate::pledge::Pledge;

/// main payment path: accrued interest is capitalized before the payment
/// is subtracted, and the accrual clock restarts at the payment date
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalizingPayment;

impl CapitalizingPayment {
    pub fn apply(
        &self,
        pledge: &Pledge,
        request: &PaymentRequest,
        history: &[Payment],
        now: DateTime<Utc>,
    ) -> Result<PaymentApplication> {
        if pledge.status.is_closed() {
            return Err(PledgeError::PledgeClosed { id: pledge.id });
        }
        validate_amount(request.amount)?;

        let accrual_start = latest_payment_date(history).unwrap_or(pledge.created_at);
        let accrued = accrued_interest(pledge.principal, pledge.monthly_rate, accrual_start, now);
        let total_due = pledge.principal_or_zero() + accrued;
        let new_principal = (total_due - request.amount).floor_zero();

        let payment = Payment::new(
            pledge.id,
            request.amount,
            request.payment_type.clone(),
            request.notes.clone(),
            now,
        );

        // the new payment opens the next accrual window
        let total_amount_due = new_principal
            + accrued_interest(Some(new_principal), pledge.monthly_rate, payment.payment_date, now);
        let total_paid = history.iter().map(|p| p.amount).sum::<Money>() + request.amount;

        // principal is already net of every payment, so the amount still due
        // is the fresh total rather than total minus lifetime payments
        let new_status = status_after_payment(new_principal, total_amount_due, total_paid);

        Ok(PaymentApplication {
            new_principal,
            new_status,
            payment,
            interest_capitalized: accrued,
            total_amount_due,
            total_paid,
        })
    }
}
