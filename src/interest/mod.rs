pub mod accrual;

use chrono::{DateTime, Utc};

use crate::decimal::{Money, Rate};

pub use accrual::{accrued_interest, interest_to_date, ProratedAccrual, TieredAccrual};

/// how an interest figure was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualMethod {
    /// flat first month, daily pro-rata after
    Tiered,
    /// straight daily pro-rata
    Prorated,
}

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub days: i64,
    pub principal_base: Money,
    pub rate: Rate,
    pub method: AccrualMethod,
}

/// interest capitalization event
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalizationResult {
    pub amount_capitalized: Money,
    pub new_principal: Money,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// trait for interest calculations
pub trait InterestCalculator {
    fn calculate_interest(
        &self,
        principal: Money,
        rate: Rate,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> InterestCalculation;
}

/// whole days between two instants, truncated toward zero.
/// negative when `end` precedes `start`.
pub fn whole_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days()
}

/// capitalize accrued interest into principal
pub fn capitalize_interest(
    principal: Money,
    accrued_interest: Money,
    reason: &str,
    timestamp: DateTime<Utc>,
) -> CapitalizationResult {
    CapitalizationResult {
        amount_capitalized: accrued_interest,
        new_principal: principal + accrued_interest,
        reason: reason.to_string(),
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_whole_days_truncate() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(whole_days_between(start, start), 0);
        assert_eq!(whole_days_between(start, start + Duration::hours(23)), 0);
        assert_eq!(whole_days_between(start, start + Duration::hours(49)), 2);
        assert_eq!(whole_days_between(start, start - Duration::days(3)), -3);
    }

    #[test]
    fn test_capitalization() {
        let principal = Money::from_major(10_000);
        let interest = Money::from_major(200);
        let now = Utc::now();

        let result = capitalize_interest(principal, interest, "rate change", now);

        assert_eq!(result.amount_capitalized, interest);
        assert_eq!(result.new_principal, Money::from_major(10_200));
        assert_eq!(result.reason, "rate change");
        assert_eq!(result.timestamp, now);
    }
}
