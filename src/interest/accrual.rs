use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate, PERIOD_DAYS};
use crate::errors::{PledgeError, Result};
use crate::interest::{whole_days_between, AccrualMethod, InterestCalculation, InterestCalculator};

/// tiered accrual: the first 30 days always cost one full month of interest,
/// every day beyond that adds one daily increment
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredAccrual;

impl TieredAccrual {
    pub fn new() -> Self {
        Self
    }

    /// tiered interest for a known number of elapsed days
    pub fn interest_for_days(&self, principal: Money, rate: Rate, days: i64) -> Money {
        let principal = principal.as_decimal();
        let monthly_interest = principal * rate.as_fraction();
        let extra_days = days.max(0) - i64::from(PERIOD_DAYS);

        if extra_days <= 0 {
            return Money::from_decimal(monthly_interest);
        }

        let extra = principal * rate.daily_fraction() * Decimal::from(extra_days);
        Money::from_decimal(monthly_interest + extra)
    }
}

impl InterestCalculator for TieredAccrual {
    fn calculate_interest(
        &self,
        principal: Money,
        rate: Rate,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> InterestCalculation {
        let days = whole_days_between(start_date, end_date);

        InterestCalculation {
            interest_amount: self.interest_for_days(principal, rate, days),
            days,
            principal_base: principal,
            rate,
            method: AccrualMethod::Tiered,
        }
    }
}

/// simple daily proration with no minimum charge
#[derive(Debug, Clone, Copy, Default)]
pub struct ProratedAccrual;

impl ProratedAccrual {
    pub fn new() -> Self {
        Self
    }

    pub fn interest_for_days(&self, principal: Money, rate: Rate, days: i64) -> Money {
        let days = Decimal::from(days.max(0));
        Money::from_decimal(principal.as_decimal() * rate.daily_fraction() * days)
    }
}

impl InterestCalculator for ProratedAccrual {
    fn calculate_interest(
        &self,
        principal: Money,
        rate: Rate,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> InterestCalculation {
        let days = whole_days_between(start_date, end_date);

        InterestCalculation {
            interest_amount: self.interest_for_days(principal, rate, days),
            days,
            principal_base: principal,
            rate,
            method: AccrualMethod::Prorated,
        }
    }
}

/// tiered interest where absent principal or rate count as zero
pub fn accrued_interest(
    principal: Option<Money>,
    rate: Option<Rate>,
    accrual_start: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> Money {
    TieredAccrual
        .calculate_interest(
            principal.unwrap_or(Money::ZERO),
            rate.unwrap_or(Rate::ZERO),
            accrual_start,
            as_of,
        )
        .interest_amount
}

/// tiered interest that refuses to guess: every input must be present
pub fn interest_to_date(
    principal: Option<Money>,
    rate: Option<Rate>,
    accrual_start: Option<DateTime<Utc>>,
    as_of: DateTime<Utc>,
) -> Result<Money> {
    let accrual_start = accrual_start.ok_or(PledgeError::MissingPrerequisite {
        field: "creation date",
    })?;
    let principal = principal.ok_or(PledgeError::MissingPrerequisite { field: "principal" })?;
    let rate = rate.ok_or(PledgeError::MissingPrerequisite {
        field: "interest rate",
    })?;

    Ok(TieredAccrual
        .calculate_interest(principal, rate, accrual_start, as_of)
        .interest_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use rust_decimal_macros::dec;

    fn two_percent() -> Rate {
        Rate::from_percent(dec!(2))
    }

    #[test]
    fn test_flat_first_month() {
        let engine = TieredAccrual::new();
        let principal = Money::from_major(10_000);

        for days in [0, 1, 10, 29, 30] {
            assert_eq!(
                engine.interest_for_days(principal, two_percent(), days),
                Money::from_major(200),
                "days = {}",
                days
            );
        }
    }

    #[test]
    fn test_day_thirty_one_adds_one_increment() {
        let engine = TieredAccrual::new();
        let principal = Money::from_major(10_000);

        let interest = engine.interest_for_days(principal, two_percent(), 31);
        let expected = Money::from_decimal(dec!(200) + dec!(10000) * dec!(0.02) / dec!(30));

        assert_eq!(interest, expected);
        assert_eq!(interest.round_dp(2), Money::from_str_exact("206.67").unwrap());
    }

    #[test]
    fn test_forty_five_days() {
        let engine = TieredAccrual::new();
        let interest = engine.interest_for_days(Money::from_major(10_000), two_percent(), 45);
        assert_eq!(interest, Money::from_major(300));
    }

    #[test]
    fn test_clock_skew_counts_as_zero_days() {
        let engine = TieredAccrual::new();
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();

        let calc = engine.calculate_interest(
            Money::from_major(500),
            two_percent(),
            start,
            start - Duration::days(40),
        );

        assert_eq!(calc.days, -40);
        assert_eq!(calc.interest_amount, Money::from_major(10));
        assert_eq!(calc.method, AccrualMethod::Tiered);
    }

    #[test]
    fn test_with_time_provider() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
        ));
        let control = time.test_control().unwrap();
        let start = time.now();

        control.advance(Duration::days(10));
        assert_eq!(
            accrued_interest(Some(Money::from_major(10_000)), Some(two_percent()), start, time.now()),
            Money::from_major(200)
        );

        control.advance(Duration::days(35));
        assert_eq!(
            accrued_interest(Some(Money::from_major(10_000)), Some(two_percent()), start, time.now()),
            Money::from_major(300)
        );
    }

    #[test]
    fn test_lenient_missing_inputs_are_zero() {
        let now = Utc::now();
        assert_eq!(accrued_interest(None, Some(two_percent()), now, now), Money::ZERO);
        assert_eq!(accrued_interest(Some(Money::from_major(100)), None, now, now), Money::ZERO);
    }

    #[test]
    fn test_strict_requires_every_input() {
        let now = Utc::now();

        let err = interest_to_date(None, Some(two_percent()), Some(now), now).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPrerequisite);

        let err = interest_to_date(Some(Money::from_major(100)), None, Some(now), now).unwrap_err();
        assert!(matches!(err, PledgeError::MissingPrerequisite { field: "interest rate" }));

        let err = interest_to_date(Some(Money::from_major(100)), Some(two_percent()), None, now)
            .unwrap_err();
        assert!(matches!(err, PledgeError::MissingPrerequisite { field: "creation date" }));

        let ok = interest_to_date(Some(Money::from_major(100)), Some(two_percent()), Some(now), now);
        assert_eq!(ok.unwrap(), Money::from_major(2));
    }

    #[test]
    fn test_prorated_has_no_minimum() {
        let engine = ProratedAccrual::new();
        let principal = Money::from_major(10_000);

        assert_eq!(engine.interest_for_days(principal, two_percent(), 0), Money::ZERO);
        assert_eq!(engine.interest_for_days(principal, two_percent(), 15), Money::from_major(100));
        assert_eq!(engine.interest_for_days(principal, two_percent(), -5), Money::ZERO);

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let calc = engine.calculate_interest(principal, two_percent(), start, start + Duration::days(30));
        assert_eq!(calc.interest_amount, Money::from_major(200));
        assert_eq!(calc.method, AccrualMethod::Prorated);
    }
}
