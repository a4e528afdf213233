//! Scripted transport for exercising delivery without a provider.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::delivery::{
    domain::{DeliveryFailure, DeliveryOutcome, EmailAddress, Message, MessageId},
    ports::{MessageTransport, TransportError, TransportResult},
};

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    result: TransportResult<DeliveryOutcome>,
    delay: Option<Duration>,
}

impl ScriptedReply {
    /// Accepts the dispatch.
    #[must_use]
    pub const fn accept() -> Self {
        Self {
            result: Ok(DeliveryOutcome::accepted()),
            delay: None,
        }
    }

    /// Accepts the dispatch and returns a provider identifier.
    #[must_use]
    pub fn accept_with_id(provider_message_id: impl Into<String>) -> Self {
        Self {
            result: Ok(DeliveryOutcome::Accepted {
                provider_message_id: Some(provider_message_id.into()),
            }),
            delay: None,
        }
    }

    /// Rejects the dispatch with `failure`.
    #[must_use]
    pub const fn reject(failure: DeliveryFailure) -> Self {
        Self {
            result: Ok(DeliveryOutcome::Rejected(failure)),
            delay: None,
        }
    }

    /// Fails to reach the provider.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            result: Err(TransportError::Unavailable(reason.into())),
            delay: None,
        }
    }

    /// Waits `delay` before replying.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: HashMap<EmailAddress, VecDeque<ScriptedReply>>,
    calls: Vec<(MessageId, EmailAddress)>,
}

/// Transport that replays queued replies per recipient.
///
/// Recipients without a queued reply are accepted. Every dispatch is
/// recorded in call order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    /// Creates a transport that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` for the next dispatch to `recipient`.
    #[must_use]
    pub fn with_reply(self, recipient: &EmailAddress, reply: ScriptedReply) -> Self {
        self.push_reply(recipient, reply);
        self
    }

    /// Queues `reply` for the next dispatch to `recipient`.
    pub fn push_reply(&self, recipient: &EmailAddress, reply: ScriptedReply) {
        if let Ok(mut state) = self.state.lock() {
            state
                .replies
                .entry(recipient.clone())
                .or_default()
                .push_back(reply);
        }
    }

    /// Returns every dispatch seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(MessageId, EmailAddress)> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// Returns how many dispatches targeted `recipient`.
    #[must_use]
    pub fn calls_to(&self, recipient: &EmailAddress) -> usize {
        self.calls()
            .iter()
            .filter(|(_, address)| address == recipient)
            .count()
    }

    fn next_reply(&self, message_id: MessageId, recipient: &EmailAddress) -> ScriptedReply {
        let Ok(mut state) = self.state.lock() else {
            return ScriptedReply::unreachable("script lock poisoned");
        };
        state.calls.push((message_id, recipient.clone()));
        state
            .replies
            .get_mut(recipient)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(ScriptedReply::accept)
    }
}

#[async_trait]
impl MessageTransport for ScriptedTransport {
    async fn dispatch(
        &self,
        message: &Message,
        recipient: &EmailAddress,
    ) -> TransportResult<DeliveryOutcome> {
        let reply = self.next_reply(message.id(), recipient);
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.result
    }
}
