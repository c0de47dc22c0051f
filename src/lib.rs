pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod notify;
pub mod payments;
pub mod pledge;
pub mod projection;
pub mod rates;
pub mod store;
pub mod types;

use std::sync::Once;

// re-export key types
pub use config::{LedgerConfig, NotificationConfig};
pub use decimal::{Money, Rate};
pub use errors::{Entity, ErrorKind, PledgeError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    accrued_interest, interest_to_date, InterestCalculation, InterestCalculator, ProratedAccrual,
    TieredAccrual,
};
pub use ledger::{PaymentReceipt, PledgeLedger};
pub use notify::{Notifier, NotifyError, PledgeNotification, TracingNotifier};
pub use payments::{Payment, PaymentApplication, PaymentRequest, PaymentStrategy};
pub use pledge::{Customer, CustomerRequest, Pledge, PledgeRequest};
pub use projection::PledgeView;
pub use rates::{RateSlab, RateTable, SlabRateTable};
pub use store::{InMemoryStore, LedgerStore, LedgerTx};
pub use types::{Collateral, CustomerId, PaymentId, PhotoRefs, PledgeId, PledgeStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

static TRACING_INIT: Once = Once::new();

const DEFAULT_LOG_DIRECTIVE: &str = "pledge_ledger_rs=info";

/// install a fmt subscriber filtered by `RUST_LOG`; ledger logs at info when it is unset.
/// safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let filter = log_filter(directives.as_deref());

        // another subscriber may already be installed by the host
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

/// caller directives win; blank or unparsable ones fall back to the default
fn log_filter(directives: Option<&str>) -> tracing_subscriber::EnvFilter {
    use tracing_subscriber::EnvFilter;

    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}
