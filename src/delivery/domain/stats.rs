//! Derived delivery statistics.

use super::{MessageId, MessageStatus, RecipientDeliveryState, RecipientStatus};
use serde::Serialize;

/// Message counts by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Pending messages.
    pub pending: u64,
    /// Queued messages, including those waiting on a retry.
    pub queued: u64,
    /// Messages under a lease.
    pub sending: u64,
    /// Sent messages.
    pub sent: u64,
    /// Delivered messages.
    pub delivered: u64,
    /// Failed messages.
    pub failed: u64,
    /// Cancelled messages.
    pub cancelled: u64,
}

impl QueueStats {
    /// Counts one message in `status`.
    pub const fn record(&mut self, status: MessageStatus) {
        let slot = match status {
            MessageStatus::Pending => &mut self.pending,
            MessageStatus::Queued => &mut self.queued,
            MessageStatus::Sending => &mut self.sending,
            MessageStatus::Sent => &mut self.sent,
            MessageStatus::Delivered => &mut self.delivered,
            MessageStatus::Failed => &mut self.failed,
            MessageStatus::Cancelled => &mut self.cancelled,
        };
        *slot = slot.saturating_add(1);
    }

    /// Builds counts from a sequence of statuses.
    #[must_use]
    pub fn from_statuses(statuses: impl IntoIterator<Item = MessageStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            stats.record(status);
        }
        stats
    }

    /// Returns the number of messages in `status`.
    #[must_use]
    pub const fn count(&self, status: MessageStatus) -> u64 {
        match status {
            MessageStatus::Pending => self.pending,
            MessageStatus::Queued => self.queued,
            MessageStatus::Sending => self.sending,
            MessageStatus::Sent => self.sent,
            MessageStatus::Delivered => self.delivered,
            MessageStatus::Failed => self.failed,
            MessageStatus::Cancelled => self.cancelled,
        }
    }

    /// Returns the number of messages counted.
    #[must_use]
    pub fn total(&self) -> u64 {
        MessageStatus::ALL
            .iter()
            .fold(0_u64, |sum, status| sum.saturating_add(self.count(*status)))
    }

    /// Returns delivered messages as a fraction of all messages.
    #[must_use]
    pub fn delivery_rate(&self) -> Option<f64> {
        ratio(self.delivered, self.total())
    }

    /// Returns failed messages as a fraction of all messages.
    #[must_use]
    pub fn failure_rate(&self) -> Option<f64> {
        ratio(self.failed, self.total())
    }
}

/// Recipient counts for one message, with derived engagement rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecipientSummary {
    /// Message the summary describes.
    pub message_id: MessageId,
    /// Recipients tracked.
    pub total: u64,
    /// Recipients still pending.
    pub pending: u64,
    /// Recipients accepted but not yet confirmed.
    pub sent: u64,
    /// Recipients confirmed delivered, including those who opened or
    /// clicked.
    pub delivered: u64,
    /// Recipients who opened, including those who clicked.
    pub opened: u64,
    /// Recipients who clicked.
    pub clicked: u64,
    /// Recipients that failed.
    pub failed: u64,
}

impl RecipientSummary {
    /// Summarises the given recipient records.
    #[must_use]
    pub fn from_statuses(message_id: MessageId, statuses: &[RecipientStatus]) -> Self {
        let mut summary = Self {
            message_id,
            total: 0,
            pending: 0,
            sent: 0,
            delivered: 0,
            opened: 0,
            clicked: 0,
            failed: 0,
        };
        for status in statuses {
            let state = status.state();
            bump(&mut summary.total, true);
            bump(&mut summary.pending, state == RecipientDeliveryState::Pending);
            bump(&mut summary.sent, state == RecipientDeliveryState::Sent);
            bump(&mut summary.delivered, state.is_delivered());
            bump(
                &mut summary.opened,
                matches!(
                    state,
                    RecipientDeliveryState::Opened | RecipientDeliveryState::Clicked
                ),
            );
            bump(&mut summary.clicked, state == RecipientDeliveryState::Clicked);
            bump(&mut summary.failed, state == RecipientDeliveryState::Failed);
        }
        summary
    }

    /// Returns delivered recipients as a fraction of all recipients.
    #[must_use]
    pub fn delivery_rate(&self) -> Option<f64> {
        ratio(self.delivered, self.total)
    }

    /// Returns recipients who opened as a fraction of those delivered.
    #[must_use]
    pub fn open_rate(&self) -> Option<f64> {
        ratio(self.opened, self.delivered)
    }

    /// Returns recipients who clicked as a fraction of those delivered.
    #[must_use]
    pub fn click_rate(&self) -> Option<f64> {
        ratio(self.clicked, self.delivered)
    }

    /// Returns failed recipients as a fraction of all recipients.
    #[must_use]
    pub fn failure_rate(&self) -> Option<f64> {
        ratio(self.failed, self.total)
    }
}

const fn bump(count: &mut u64, hit: bool) {
    if hit {
        *count = count.saturating_add(1);
    }
}

/// Returns `part / whole`, or `None` when `whole` is zero.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "rates are reporting ratios of counts far below 2^52"
)]
fn ratio(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(part as f64 / whole as f64)
}
