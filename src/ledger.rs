use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{Entity, PledgeError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{capitalize_interest, InterestCalculator, ProratedAccrual};
use crate::notify::{Notifier, PledgeNotification, TracingNotifier};
use crate::payments::{latest_payment_date, Payment, PaymentRequest, PaymentStrategy};
use crate::pledge::{Customer, CustomerRequest, Pledge, PledgeRequest};
use crate::projection::PledgeView;
use crate::rates::{RateTable, SlabRateTable};
use crate::store::{InMemoryStore, LedgerStore, LedgerTx};
use crate::types::{CustomerId, PaymentId, PledgeId, PledgeStatus};

/// result of a payment on either path
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub pledge: PledgeView,
    pub interest_capitalized: Money,
    pub total_amount_due: Money,
    pub total_paid: Money,
}

/// pledge lifecycle manager
pub struct PledgeLedger<S, R, N> {
    store: S,
    rates: R,
    notifier: N,
    config: LedgerConfig,
    events: EventStore,
}

impl PledgeLedger<InMemoryStore, SlabRateTable, TracingNotifier> {
    /// in-memory ledger using the configured rate slabs
    pub fn in_memory(config: LedgerConfig) -> Self {
        let rates = config.rates.clone();
        Self::new(InMemoryStore::new(), rates, TracingNotifier, config)
    }
}

impl<S, R, N> PledgeLedger<S, R, N>
where
    S: LedgerStore,
    R: RateTable,
    N: Notifier,
{
    pub fn new(store: S, rates: R, notifier: N, config: LedgerConfig) -> Self {
        Self {
            store,
            rates,
            notifier,
            config,
            events: EventStore::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// register a customer
    pub fn register_customer(
        &mut self,
        request: CustomerRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Customer> {
        request.validate()?;
        let now = time_provider.now();
        let customer = request.into_customer(now);

        let saved = self
            .store
            .transaction(|tx| tx.save_customer(customer.clone()))?;

        tracing::info!(customer_id = %saved.id, "customer registered");
        self.events.emit(Event::CustomerRegistered {
            customer_id: saved.id,
            timestamp: now,
        });

        Ok(saved)
    }

    pub fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        self.store.read(|tx| tx.require_customer(id))
    }

    /// originate a pledge; rate falls back to the rate table when the request
    /// has no positive rate
    pub fn create_pledge(
        &mut self,
        request: PledgeRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PledgeView> {
        let now = time_provider.now();
        let rate = match request.positive_rate() {
            Some(rate) => rate,
            None => self
                .rates
                .rate_for_amount(request.amount.unwrap_or(Money::ZERO)),
        };

        let pledge = Pledge::originate(request, rate, now);
        pledge.check_deadline()?;

        let saved = self.store.transaction(|tx| {
            tx.require_customer(pledge.customer_id)?;
            tx.save_pledge(pledge.clone())
        })?;

        tracing::info!(
            pledge_id = %saved.id,
            customer_id = %saved.customer_id,
            principal = %saved.principal_or_zero(),
            rate = %rate,
            "pledge created"
        );
        self.events.emit(Event::PledgeCreated {
            pledge_id: saved.id,
            customer_id: saved.customer_id,
            principal: saved.principal,
            monthly_rate: rate,
            timestamp: now,
        });
        self.dispatch_notification(&saved);

        Ok(PledgeView::project(&saved, Ok(None), now))
    }

    pub fn get_pledge(&self, id: PledgeId, time_provider: &SafeTimeProvider) -> Result<PledgeView> {
        let now = time_provider.now();
        self.store.read(|tx| {
            let pledge = tx.require_pledge(id)?;
            Ok(view_of(tx, &pledge, now))
        })
    }

    /// all pledges, after closing exhausted ones
    pub fn list_pledges(&mut self, time_provider: &SafeTimeProvider) -> Result<Vec<PledgeView>> {
        self.reconcile(time_provider)?;
        let now = time_provider.now();
        self.store.read(|tx| {
            Ok(tx
                .find_all_pledges()?
                .iter()
                .map(|pledge| view_of(tx, pledge, now))
                .collect())
        })
    }

    /// a customer's pledges, after closing exhausted ones
    pub fn list_pledges_for_customer(
        &mut self,
        customer_id: CustomerId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<PledgeView>> {
        self.reconcile(time_provider)?;
        let now = time_provider.now();
        self.store.read(|tx| {
            Ok(tx
                .find_pledges_by_customer(customer_id)?
                .iter()
                .map(|pledge| view_of(tx, pledge, now))
                .collect())
        })
    }

    /// edit a pledge. a changed positive rate first folds interest accrued
    /// since the last snapshot into principal at the old rate.
    pub fn update_pledge(
        &mut self,
        id: PledgeId,
        request: PledgeRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PledgeView> {
        let now = time_provider.now();

        let (saved, events) = self.store.transaction(|tx| {
            let mut pledge = tx.require_pledge(id)?;
            let old_status = pledge.status;
            let mut events = Vec::new();

            let new_rate = request
                .positive_rate()
                .filter(|rate| pledge.monthly_rate != Some(*rate));
            if let Some(new_rate) = new_rate {
                let old_rate = pledge.monthly_rate;
                let principal = pledge.principal_or_zero();
                let calculation = ProratedAccrual.calculate_interest(
                    principal,
                    old_rate.unwrap_or(Rate::ZERO),
                    pledge.accrual_anchor(),
                    now,
                );
                let capitalized = capitalize_interest(
                    principal,
                    calculation.interest_amount,
                    "interest rate change",
                    now,
                );

                tracing::debug!(
                    pledge_id = %pledge.id,
                    days = calculation.days,
                    accrued = %capitalized.amount_capitalized,
                    "accrued before rate change"
                );

                pledge.principal = Some(capitalized.new_principal);
                pledge.last_interest_accrued_at = Some(now);
                pledge.monthly_rate = Some(new_rate);

                events.push(Event::InterestCapitalized {
                    pledge_id: pledge.id,
                    amount: capitalized.amount_capitalized,
                    new_principal: capitalized.new_principal,
                    reason: capitalized.reason,
                    timestamp: now,
                });
                events.push(Event::InterestRateChanged {
                    pledge_id: pledge.id,
                    old_rate,
                    new_rate,
                    timestamp: now,
                });
            }

            pledge.apply_edits(&request);
            if let Some(amount) = request.positive_amount() {
                pledge.principal = Some(amount);
            }
            pledge.check_deadline()?;

            if pledge.status != old_status {
                events.push(Event::StatusChanged {
                    pledge_id: pledge.id,
                    old_status,
                    new_status: pledge.status,
                    reason: "edited".to_string(),
                    timestamp: now,
                });
            }
            events.push(Event::PledgeUpdated {
                pledge_id: pledge.id,
                principal: pledge.principal,
                timestamp: now,
            });

            let saved = tx.save_pledge(pledge)?;
            Ok((saved, events))
        })?;

        tracing::info!(pledge_id = %saved.id, principal = %saved.principal_or_zero(), "pledge updated");
        self.events.extend(events);
        self.dispatch_notification(&saved);

        self.get_pledge(saved.id, time_provider)
    }

    /// remove a pledge from storage
    pub fn delete_pledge(&mut self, id: PledgeId, time_provider: &SafeTimeProvider) -> Result<()> {
        self.store.transaction(|tx| tx.delete_pledge(id))?;

        tracing::info!(pledge_id = %id, "pledge deleted");
        self.events.emit(Event::PledgeDeleted {
            pledge_id: id,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    /// main payment path: capitalize interest, subtract, clamp at zero
    pub fn apply_payment(
        &mut self,
        pledge_id: PledgeId,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        self.settle(PaymentStrategy::Capitalizing, pledge_id, request, time_provider)
    }

    /// direct path: subtract from principal only, reject overpayment
    pub fn record_payment(
        &mut self,
        pledge_id: PledgeId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        // the direct path derives FULL/PARTIAL itself
        let request = PaymentRequest::new(amount, String::new());
        self.settle(PaymentStrategy::Direct, pledge_id, request, time_provider)
    }

    fn settle(
        &mut self,
        strategy: PaymentStrategy,
        pledge_id: PledgeId,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        let now = time_provider.now();

        let (receipt, events) = self.store.transaction(|tx| {
            let pledge = tx.require_pledge(pledge_id)?;
            let history = tx.find_payments_by_pledge(pledge_id)?;
            let application = strategy.apply(&pledge, &request, &history, now)?;

            // principal is written before the ledger entry
            let mut updated = pledge.clone();
            updated.principal = Some(application.new_principal);
            let mut updated = tx.save_pledge(updated)?;
            let payment = tx.save_payment(application.payment.clone())?;

            updated.status = application.new_status;
            let updated = tx.save_pledge(updated)?;

            let mut events = Vec::new();
            if application.interest_capitalized.is_positive() {
                events.push(Event::InterestCapitalized {
                    pledge_id,
                    amount: application.interest_capitalized,
                    new_principal: pledge.principal_or_zero() + application.interest_capitalized,
                    reason: "payment".to_string(),
                    timestamp: now,
                });
            }
            events.push(Event::PaymentReceived {
                pledge_id,
                payment_id: payment.id,
                amount: payment.amount,
                new_principal: application.new_principal,
                timestamp: now,
            });
            if updated.status != pledge.status {
                events.push(Event::StatusChanged {
                    pledge_id,
                    old_status: pledge.status,
                    new_status: updated.status,
                    reason: format!("{:?} payment", strategy),
                    timestamp: now,
                });
            }

            let receipt = PaymentReceipt {
                payment,
                pledge: view_of(tx, &updated, now),
                interest_capitalized: application.interest_capitalized,
                total_amount_due: application.total_amount_due,
                total_paid: application.total_paid,
            };
            Ok((receipt, events))
        })?;

        tracing::info!(
            pledge_id = %pledge_id,
            strategy = ?strategy,
            amount = %receipt.payment.amount,
            principal = ?receipt.pledge.amount,
            status = %receipt.pledge.status,
            "payment applied"
        );
        self.events.extend(events);

        Ok(receipt)
    }

    /// close every ACTIVE pledge whose principal has reached zero.
    /// each pledge is re-checked and closed in its own transaction.
    pub fn reconcile(&mut self, time_provider: &SafeTimeProvider) -> Result<Vec<PledgeId>> {
        let now = time_provider.now();
        let candidates: Vec<PledgeId> = self.store.read(|tx| {
            Ok(tx
                .find_all_pledges()?
                .into_iter()
                .filter(is_exhausted)
                .map(|pledge| pledge.id)
                .collect())
        })?;

        let mut closed = Vec::new();
        for id in candidates {
            let swept = self.store.transaction(|tx| match tx.find_pledge(id)? {
                Some(mut pledge) if is_exhausted(&pledge) => {
                    pledge.status = PledgeStatus::Closed;
                    tx.save_pledge(pledge).map(Some)
                }
                _ => Ok(None),
            })?;

            if let Some(pledge) = swept {
                tracing::info!(pledge_id = %pledge.id, principal = %pledge.principal_or_zero(), "auto-closed exhausted pledge");
                self.events.emit(Event::StatusChanged {
                    pledge_id: pledge.id,
                    old_status: PledgeStatus::Active,
                    new_status: PledgeStatus::Closed,
                    reason: "principal exhausted".to_string(),
                    timestamp: now,
                });
                self.events.emit(Event::PledgeAutoClosed {
                    pledge_id: pledge.id,
                    principal: pledge.principal_or_zero(),
                    timestamp: now,
                });
                closed.push(pledge.id);
            }
        }

        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "reconcile closed pledges");
        }
        Ok(closed)
    }

    /// tiered interest since origination; fails when principal or rate is unset
    pub fn interest_to_date(&self, id: PledgeId, time_provider: &SafeTimeProvider) -> Result<Money> {
        let pledge = self.store.read(|tx| tx.require_pledge(id))?;
        pledge.total_interest_to_date(time_provider.now())
    }

    /// principal plus `interest_to_date`
    pub fn total_amount(&self, id: PledgeId, time_provider: &SafeTimeProvider) -> Result<Money> {
        let pledge = self.store.read(|tx| tx.require_pledge(id))?;
        pledge.total_amount(time_provider.now())
    }

    /// payment history, newest first
    pub fn payments_for_pledge(&self, pledge_id: PledgeId) -> Result<Vec<Payment>> {
        self.store.read(|tx| {
            tx.require_pledge(pledge_id)?;
            tx.find_payments_by_pledge(pledge_id)
        })
    }

    pub fn total_paid(&self, pledge_id: PledgeId) -> Result<Money> {
        self.store.read(|tx| tx.sum_payments_by_pledge(pledge_id))
    }

    pub fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        self.store.read(|tx| {
            tx.find_payment(id)?
                .ok_or_else(|| PledgeError::not_found(Entity::Payment, id))
        })
    }

    /// remove a ledger entry; balances are not recomputed
    pub fn delete_payment(&mut self, id: PaymentId, time_provider: &SafeTimeProvider) -> Result<()> {
        self.store.transaction(|tx| tx.delete_payment(id))?;

        tracing::info!(payment_id = %id, "payment deleted");
        self.events.emit(Event::PaymentDeleted {
            payment_id: id,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    fn dispatch_notification(&self, pledge: &Pledge) {
        let settings = &self.config.notifications;
        if !settings.enabled {
            tracing::debug!(pledge_id = %pledge.id, "notifications disabled");
            return;
        }

        let notification = PledgeNotification::for_pledge(pledge, settings.default_recipient.clone());
        if let Err(err) = self.notifier.notify(&notification) {
            tracing::warn!(pledge_id = %pledge.id, error = %err, "pledge notification failed");
        }
    }
}

fn is_exhausted(pledge: &Pledge) -> bool {
    pledge.status == PledgeStatus::Active && pledge.principal.map_or(false, |p| p <= Money::ZERO)
}

fn view_of(tx: &dyn LedgerTx, pledge: &Pledge, now: DateTime<Utc>) -> PledgeView {
    let last_payment = tx
        .find_payments_by_pledge(pledge.id)
        .map(|payments| latest_payment_date(&payments));
    PledgeView::project(pledge, last_payment, now)
}
