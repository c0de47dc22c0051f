use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{CustomerId, PaymentId, PledgeId, PledgeStatus};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CustomerRegistered {
        customer_id: CustomerId,
        timestamp: DateTime<Utc>,
    },

    // lifecycle events
    PledgeCreated {
        pledge_id: PledgeId,
        customer_id: CustomerId,
        principal: Option<Money>,
        monthly_rate: Rate,
        timestamp: DateTime<Utc>,
    },
    PledgeUpdated {
        pledge_id: PledgeId,
        principal: Option<Money>,
        timestamp: DateTime<Utc>,
    },
    PledgeDeleted {
        pledge_id: PledgeId,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        pledge_id: PledgeId,
        old_status: PledgeStatus,
        new_status: PledgeStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    PledgeAutoClosed {
        pledge_id: PledgeId,
        principal: Money,
        timestamp: DateTime<Utc>,
    },

    // interest events
    InterestCapitalized {
        pledge_id: PledgeId,
        amount: Money,
        new_principal: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    InterestRateChanged {
        pledge_id: PledgeId,
        old_rate: Option<Rate>,
        new_rate: Rate,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        pledge_id: PledgeId,
        payment_id: PaymentId,
        amount: Money,
        new_principal: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentDeleted {
        payment_id: PaymentId,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
