use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::decimal::Money;
use crate::errors::{Entity, PledgeError, Result};
use crate::payments::Payment;
use crate::pledge::{Customer, Pledge};
use crate::types::{CustomerId, PaymentId, PledgeId};

/// repository calls available inside one transactional scope
pub trait LedgerTx {
    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    fn save_customer(&mut self, customer: Customer) -> Result<Customer>;

    fn find_pledge(&self, id: PledgeId) -> Result<Option<Pledge>>;
    fn find_all_pledges(&self) -> Result<Vec<Pledge>>;
    fn find_pledges_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Pledge>>;
    /// insert or replace
    fn save_pledge(&mut self, pledge: Pledge) -> Result<Pledge>;
    fn delete_pledge(&mut self, id: PledgeId) -> Result<()>;

    fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>>;
    /// newest first
    fn find_payments_by_pledge(&self, pledge_id: PledgeId) -> Result<Vec<Payment>>;
    fn save_payment(&mut self, payment: Payment) -> Result<Payment>;
    fn sum_payments_by_pledge(&self, pledge_id: PledgeId) -> Result<Money>;
    fn delete_payment(&mut self, id: PaymentId) -> Result<()>;

    fn require_pledge(&self, id: PledgeId) -> Result<Pledge> {
        self.find_pledge(id)?
            .ok_or_else(|| PledgeError::not_found(Entity::Pledge, id))
    }

    fn require_customer(&self, id: CustomerId) -> Result<Customer> {
        self.find_customer(id)?
            .ok_or_else(|| PledgeError::not_found(Entity::Customer, id))
    }
}

/// storage backend. `transaction` must commit every write made by `f` when it
/// returns `Ok` and none of them when it returns `Err`.
pub trait LedgerStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T>;

    /// consistent read-only view of committed data
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerTx) -> Result<T>;
}

#[derive(Debug, Clone, Default)]
struct StoreData {
    customers: HashMap<CustomerId, Customer>,
    pledges: HashMap<PledgeId, Pledge>,
    payments: HashMap<PaymentId, Payment>,
    payments_by_pledge: HashMap<PledgeId, Vec<PaymentId>>,
}

impl StoreData {
    fn payments_of(&self, pledge_id: PledgeId) -> impl Iterator<Item = &Payment> + '_ {
        self.payments_by_pledge
            .get(&pledge_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.payments.get(id))
    }

    fn unindex_payment(&mut self, payment: &Payment) {
        if let Some(ids) = self.payments_by_pledge.get_mut(&payment.pledge_id) {
            ids.retain(|id| *id != payment.id);
            if ids.is_empty() {
                self.payments_by_pledge.remove(&payment.pledge_id);
            }
        }
    }
}

impl LedgerTx for StoreData {
    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.get(&id).cloned())
    }

    fn save_customer(&mut self, customer: Customer) -> Result<Customer> {
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    fn find_pledge(&self, id: PledgeId) -> Result<Option<Pledge>> {
        Ok(self.pledges.get(&id).cloned())
    }

    fn find_all_pledges(&self) -> Result<Vec<Pledge>> {
        let mut pledges: Vec<Pledge> = self.pledges.values().cloned().collect();
        pledges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pledges)
    }

    fn find_pledges_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Pledge>> {
        Ok(self
            .find_all_pledges()?
            .into_iter()
            .filter(|p| p.customer_id == customer_id)
            .collect())
    }

    fn save_pledge(&mut self, pledge: Pledge) -> Result<Pledge> {
        self.pledges.insert(pledge.id, pledge.clone());
        Ok(pledge)
    }

    fn delete_pledge(&mut self, id: PledgeId) -> Result<()> {
        self.pledges
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PledgeError::not_found(Entity::Pledge, id))
    }

    fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.payments.get(&id).cloned())
    }

    fn find_payments_by_pledge(&self, pledge_id: PledgeId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.payments_of(pledge_id).cloned().collect();
        payments.sort_by(|a, b| {
            b.payment_date
                .cmp(&a.payment_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(payments)
    }

    fn save_payment(&mut self, payment: Payment) -> Result<Payment> {
        if let Some(previous) = self.payments.insert(payment.id, payment.clone()) {
            self.unindex_payment(&previous);
        }
        self.payments_by_pledge
            .entry(payment.pledge_id)
            .or_default()
            .push(payment.id);
        Ok(payment)
    }

    fn sum_payments_by_pledge(&self, pledge_id: PledgeId) -> Result<Money> {
        Ok(self.payments_of(pledge_id).map(|p| p.amount).sum())
    }

    fn delete_payment(&mut self, id: PaymentId) -> Result<()> {
        let removed = self
            .payments
            .remove(&id)
            .ok_or_else(|| PledgeError::not_found(Entity::Payment, id))?;
        self.unindex_payment(&removed);
        Ok(())
    }
}

/// in-process store. each transaction works on a copy that replaces the
/// committed data only on success; reads borrow the committed data directly.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreData>> {
        self.data.lock().map_err(|e| PledgeError::Storage {
            message: format!("store lock poisoned: {}", e),
        })
    }
}

impl LedgerStore for InMemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T>,
    {
        let mut committed = self.lock()?;

        let mut working = committed.clone();
        let value = f(&mut working)?;
        *committed = working;

        Ok(value)
    }

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerTx) -> Result<T>,
    {
        let committed = self.lock()?;
        f(&*committed)
    }
}
