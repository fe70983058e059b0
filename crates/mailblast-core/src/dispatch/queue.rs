//! Queue adapter: asynchronous worker or synchronous execution, selected
//! once at process start.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::QueueConfig;
use crate::error::{Error, Result};

use super::pipeline::Dispatcher;

/// Hands queued messages to the dispatch pipeline.
///
/// With a task queue configured, messages run on a background worker with
/// bounded retry; without one, dispatch executes in the caller's path and
/// the caller observes the outcome directly. Both strategies converge on
/// identical terminal message states.
#[derive(Clone)]
pub enum DispatchQueue {
    /// Execute dispatch inline.
    Synchronous(Arc<Dispatcher>),
    /// Hand off to the background worker.
    Worker(mpsc::Sender<i64>),
}

impl DispatchQueue {
    /// Selects the strategy from configuration and, for the worker
    /// strategy, spawns the background task.
    #[must_use]
    pub fn start(config: &QueueConfig, dispatcher: Arc<Dispatcher>) -> Self {
        if !config.enabled {
            info!("dispatch queue disabled, running synchronously");
            return Self::Synchronous(dispatcher);
        }

        let (sender, receiver) = mpsc::channel(config.depth.max(1));
        let policy = RetryPolicy::from_config(config);
        tokio::spawn(run_worker(receiver, dispatcher, policy));
        info!(depth = config.depth, "dispatch queue worker started");
        Self::Worker(sender)
    }

    /// Enqueues a message for dispatch.
    ///
    /// # Errors
    ///
    /// Synchronous strategy: propagates the dispatch outcome. Worker
    /// strategy: fails only when the queue has shut down.
    pub async fn enqueue(&self, message_id: i64) -> Result<()> {
        match self {
            Self::Synchronous(dispatcher) => dispatcher.dispatch(message_id).await,
            Self::Worker(sender) => sender
                .send(message_id)
                .await
                .map_err(|_| Error::QueueClosed),
        }
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    cap: Duration,
}

impl RetryPolicy {
    fn from_config(config: &QueueConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: config.retry_base,
            cap: config.retry_cap,
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`,
    /// capped.
    fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<i64>,
    dispatcher: Arc<Dispatcher>,
    policy: RetryPolicy,
) {
    while let Some(message_id) = receiver.recv().await {
        deliver_with_retry(message_id, &dispatcher, policy).await;
    }
    info!("dispatch queue worker stopped");
}

async fn deliver_with_retry(message_id: i64, dispatcher: &Dispatcher, policy: RetryPolicy) {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let failure = match dispatcher.try_dispatch(message_id).await {
            Ok(()) => return,
            Err(err) => err,
        };

        let transient = matches!(&failure, Error::Transport(t) if t.is_transient());
        if transient && attempt < policy.max_attempts {
            let delay = policy.delay(attempt - 1);
            warn!(
                message_id,
                attempt,
                delay_secs = delay.as_secs_f64(),
                error = %failure,
                "dispatch failed, retrying"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        warn!(message_id, attempt, error = %failure, "dispatch exhausted");
        if let Err(storage) = dispatcher.record_failure(message_id, &failure).await {
            error!(message_id, error = %storage, "could not record dispatch failure");
        }
        return;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::dispatch::pipeline::tests::{Behavior, FakeTransport, fixture};
    use crate::dispatch::transport::{MailTransport, TransportError};
    use crate::messages::{MessageRepository, MessageStatus};
    use crate::store;

    fn queue_config(enabled: bool) -> QueueConfig {
        QueueConfig {
            enabled,
            depth: 16,
            max_attempts: 3,
            retry_base: Duration::from_millis(5),
            retry_cap: Duration::from_millis(20),
        }
    }

    async fn wait_for_terminal(messages: &MessageRepository, id: i64) -> MessageStatus {
        for _ in 0..200 {
            let message = messages.get(id).await.unwrap().unwrap();
            if message.status.is_terminal() {
                return message.status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("message {id} never reached a terminal state");
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base: Duration::from_secs(10),
            cap: Duration::from_secs(300),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(10));
        assert_eq!(policy.delay(1), Duration::from_secs(20));
        assert_eq!(policy.delay(2), Duration::from_secs(40));
        assert_eq!(policy.delay(10), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn synchronous_strategy_reports_outcome_inline() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let transport = FakeTransport::new(Behavior::Accept);
        let dispatcher = Arc::new(Dispatcher::new(
            fx.messages.clone(),
            Arc::clone(&transport) as Arc<dyn MailTransport>,
            ProviderConfig::default(),
        ));

        let queue = DispatchQueue::start(&queue_config(false), dispatcher);
        queue.enqueue(fx.message_id).await.unwrap();

        let message = fx.messages.get(fx.message_id).await.unwrap().unwrap();
        assert_eq!(message.status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn worker_strategy_reaches_the_same_terminal_state() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let transport = FakeTransport::new(Behavior::Accept);
        let dispatcher = Arc::new(Dispatcher::new(
            fx.messages.clone(),
            Arc::clone(&transport) as Arc<dyn MailTransport>,
            ProviderConfig::default(),
        ));

        let queue = DispatchQueue::start(&queue_config(true), dispatcher);
        queue.enqueue(fx.message_id).await.unwrap();

        assert_eq!(
            wait_for_terminal(&fx.messages, fx.message_id).await,
            MessageStatus::Sent
        );
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn provider_outage_exhausts_retries_then_fails() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let transport = FakeTransport::new(Behavior::Fail(TransportError::Network(
            "provider outage".to_string(),
        )));
        let dispatcher = Arc::new(Dispatcher::new(
            fx.messages.clone(),
            Arc::clone(&transport) as Arc<dyn MailTransport>,
            ProviderConfig::default(),
        ));

        let queue = DispatchQueue::start(&queue_config(true), dispatcher);
        queue.enqueue(fx.message_id).await.unwrap();

        assert_eq!(
            wait_for_terminal(&fx.messages, fx.message_id).await,
            MessageStatus::Failed
        );
        // Retry cap of 3 means exactly 3 attempts.
        assert_eq!(transport.calls().len(), 3);

        let message = fx.messages.get(fx.message_id).await.unwrap().unwrap();
        assert_eq!(message.error.as_deref(), Some("network: provider outage"));
    }

    #[tokio::test]
    async fn definitive_rejection_is_not_retried_by_the_worker() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let transport = FakeTransport::new(Behavior::Fail(TransportError::Rejected {
            kind: crate::dispatch::RejectionKind::Other,
            detail: "blocked".to_string(),
        }));
        let dispatcher = Arc::new(Dispatcher::new(
            fx.messages.clone(),
            Arc::clone(&transport) as Arc<dyn MailTransport>,
            ProviderConfig::default(),
        ));

        let queue = DispatchQueue::start(&queue_config(true), dispatcher);
        queue.enqueue(fx.message_id).await.unwrap();

        assert_eq!(
            wait_for_terminal(&fx.messages, fx.message_id).await,
            MessageStatus::Failed
        );
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_enqueue_never_sends_twice() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let transport = FakeTransport::new(Behavior::Accept);
        let dispatcher = Arc::new(Dispatcher::new(
            fx.messages.clone(),
            Arc::clone(&transport) as Arc<dyn MailTransport>,
            ProviderConfig::default(),
        ));

        let queue = DispatchQueue::start(&queue_config(true), dispatcher);
        queue.enqueue(fx.message_id).await.unwrap();
        queue.enqueue(fx.message_id).await.unwrap();

        assert_eq!(
            wait_for_terminal(&fx.messages, fx.message_id).await,
            MessageStatus::Sent
        );
        // Drain: give the worker time to process the duplicate.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.calls().len(), 1);
    }
}
