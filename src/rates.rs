use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{PledgeError, Result};

/// default monthly rate when nothing more specific applies
pub const DEFAULT_MONTHLY_RATE_PERCENT: u32 = 2;

/// source of default rates for new pledges
pub trait RateTable {
    fn rate_for_amount(&self, amount: Money) -> Rate;
}

/// one band of a slab table; `up_to` is inclusive, `None` is open-ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSlab {
    pub up_to: Option<Money>,
    pub rate: Rate,
}

/// ordered loan-amount slabs. the first slab whose bound covers the amount wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabRateTable {
    pub slabs: Vec<RateSlab>,
    /// used when no slab covers the amount
    pub fallback: Rate,
}

impl SlabRateTable {
    /// single flat rate for every amount
    pub fn flat(rate: Rate) -> Self {
        Self {
            slabs: Vec::new(),
            fallback: rate,
        }
    }

    /// typical gold-loan banding: smaller tickets carry a higher rate
    pub fn tiered() -> Self {
        Self {
            slabs: vec![
                RateSlab {
                    up_to: Some(Money::from_major(25_000)),
                    rate: Rate::from_percent(dec!(2.5)),
                },
                RateSlab {
                    up_to: Some(Money::from_major(100_000)),
                    rate: Rate::from_percent(dec!(2)),
                },
                RateSlab {
                    up_to: None,
                    rate: Rate::from_percent(dec!(1.5)),
                },
            ],
            fallback: Rate::from_percentage(DEFAULT_MONTHLY_RATE_PERCENT),
        }
    }

    /// slabs must be positive-rated and strictly ascending, with at most one
    /// open-ended slab placed last
    pub fn validate(&self) -> Result<()> {
        if !self.fallback.is_positive() {
            return Err(invalid("fallback rate must be positive"));
        }

        let mut previous: Option<Money> = None;
        for (index, slab) in self.slabs.iter().enumerate() {
            if !slab.rate.is_positive() {
                return Err(invalid("slab rates must be positive"));
            }
            match slab.up_to {
                Some(bound) => {
                    if previous.map_or(false, |p| bound <= p) {
                        return Err(invalid("slab bounds must be strictly ascending"));
                    }
                    previous = Some(bound);
                }
                None if index + 1 != self.slabs.len() => {
                    return Err(invalid("open-ended slab must be last"));
                }
                None => {}
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> PledgeError {
    PledgeError::InvalidConfiguration {
        message: message.to_string(),
    }
}

impl Default for SlabRateTable {
    fn default() -> Self {
        Self::flat(Rate::from_percentage(DEFAULT_MONTHLY_RATE_PERCENT))
    }
}

impl RateTable for SlabRateTable {
    fn rate_for_amount(&self, amount: Money) -> Rate {
        self.slabs
            .iter()
            .find(|slab| slab.up_to.map_or(true, |bound| amount <= bound))
            .map(|slab| slab.rate)
            .unwrap_or(self.fallback)
    }
}
