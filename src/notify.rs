use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::pledge::Pledge;
use crate::types::{CustomerId, PhotoRefs, PledgeId};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// final values sent out after a pledge is created or edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PledgeNotification {
    pub pledge_id: PledgeId,
    pub customer_id: CustomerId,
    pub principal: Option<Money>,
    pub monthly_rate: Option<Rate>,
    pub photos: PhotoRefs,
    pub recipient: Option<String>,
}

impl PledgeNotification {
    pub fn for_pledge(pledge: &Pledge, recipient: Option<String>) -> Self {
        Self {
            pledge_id: pledge.id,
            customer_id: pledge.customer_id,
            principal: pledge.principal,
            monthly_rate: pledge.monthly_rate,
            photos: pledge.photos.clone(),
            recipient,
        }
    }

    pub fn subject(&self) -> String {
        format!("Pledge {} photos and details", self.pledge_id)
    }

    /// plain-text body listing the figures and any photo links
    pub fn body(&self) -> String {
        let mut body = format!(
            "Pledge ID: {}\nCustomer ID: {}\nAmount (current principal): {}\nInterest Rate (monthly %): {}\n",
            self.pledge_id,
            self.customer_id,
            display_or_dash(self.principal),
            display_or_dash(self.monthly_rate.map(|r| r.as_percent())),
        );

        let labelled = [
            ("Customer Photo", &self.photos.customer_photo),
            ("Item Photo", &self.photos.item_photo),
            ("Receipt Photo", &self.photos.receipt_photo),
        ];
        let mut first = true;
        for (label, url) in labelled {
            if let Some(url) = url.as_deref().filter(|u| !u.trim().is_empty()) {
                if first {
                    body.push('\n');
                    first = false;
                }
                body.push_str(&format!("{}: {}\n", label, url));
            }
        }

        body
    }
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// best-effort outbound notifier; failures never affect the ledger
pub trait Notifier {
    fn notify(&self, notification: &PledgeNotification) -> Result<(), NotifyError>;
}

/// writes notifications to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &PledgeNotification) -> Result<(), NotifyError> {
        tracing::info!(
            pledge_id = %notification.pledge_id,
            customer_id = %notification.customer_id,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            subject = %notification.subject(),
            "pledge notification"
        );
        tracing::debug!(pledge_id = %notification.pledge_id, body = %notification.body(), "pledge notification body");
        Ok(())
    }
}
