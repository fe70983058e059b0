//! Campaign send entry points.

use serde::Serialize;
use tracing::{info, warn};

use crate::campaigns::CampaignRepository;
use crate::contacts::{ContactRepository, ContactStatus};
use crate::dispatch::DispatchQueue;
use crate::error::{Error, Result};
use crate::messages::{CampaignStats, MessageRepository};

/// Outcome of a campaign enqueue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EnqueueSummary {
    /// Messages created and handed to the queue.
    pub enqueued: usize,
    /// Messages whose synchronous dispatch failed on the spot (they are
    /// terminal `failed`, visible via message listing).
    pub failed: usize,
}

/// Creates one queued message per contact matching `status_filter` and
/// hands each to the queue adapter.
///
/// Recipient selection happens here: with the default `valid` filter, only
/// contacts that passed validation at enqueue time ever reach dispatch.
///
/// # Errors
///
/// Returns [`Error::CampaignNotFound`] for an unknown campaign, or a
/// storage/queue error.
pub async fn send_campaign(
    campaigns: &CampaignRepository,
    contacts: &ContactRepository,
    messages: &MessageRepository,
    queue: &DispatchQueue,
    campaign_id: i64,
    status_filter: ContactStatus,
) -> Result<EnqueueSummary> {
    if campaigns.get(campaign_id).await?.is_none() {
        return Err(Error::CampaignNotFound(campaign_id));
    }

    let recipients = contacts.list(Some(status_filter)).await?;
    let mut summary = EnqueueSummary::default();
    for contact in recipients {
        enqueue_one(messages, queue, campaign_id, contact.id, &mut summary).await?;
    }

    info!(
        campaign_id,
        enqueued = summary.enqueued,
        failed = summary.failed,
        "campaign enqueued"
    );
    Ok(summary)
}

/// Like [`send_campaign`] but for an explicit contact-id list; unknown ids
/// are skipped.
///
/// # Errors
///
/// Returns [`Error::CampaignNotFound`] for an unknown campaign, or a
/// storage/queue error.
pub async fn send_selected(
    campaigns: &CampaignRepository,
    contacts: &ContactRepository,
    messages: &MessageRepository,
    queue: &DispatchQueue,
    campaign_id: i64,
    contact_ids: &[i64],
) -> Result<EnqueueSummary> {
    if campaigns.get(campaign_id).await?.is_none() {
        return Err(Error::CampaignNotFound(campaign_id));
    }

    let mut summary = EnqueueSummary::default();
    for &contact_id in contact_ids {
        if contacts.get(contact_id).await?.is_none() {
            warn!(campaign_id, contact_id, "skipping unknown contact");
            continue;
        }
        enqueue_one(messages, queue, campaign_id, contact_id, &mut summary).await?;
    }

    Ok(summary)
}

/// Delivery counters for one campaign.
///
/// # Errors
///
/// Returns [`Error::CampaignNotFound`] for an unknown campaign, or a
/// storage error.
pub async fn campaign_stats(
    campaigns: &CampaignRepository,
    messages: &MessageRepository,
    campaign_id: i64,
) -> Result<CampaignStats> {
    if campaigns.get(campaign_id).await?.is_none() {
        return Err(Error::CampaignNotFound(campaign_id));
    }
    messages.stats(campaign_id).await
}

async fn enqueue_one(
    messages: &MessageRepository,
    queue: &DispatchQueue,
    campaign_id: i64,
    contact_id: i64,
    summary: &mut EnqueueSummary,
) -> Result<()> {
    let message = messages.create_queued(campaign_id, contact_id).await?;
    match queue.enqueue(message.id).await {
        Ok(()) => summary.enqueued += 1,
        // The queue itself being gone is fatal; a synchronous dispatch
        // failure settles this message and the loop carries on.
        Err(Error::QueueClosed) => return Err(Error::QueueClosed),
        Err(err) => {
            warn!(message_id = message.id, error = %err, "synchronous dispatch failed");
            summary.failed += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::campaigns::NewCampaign;
    use crate::config::ProviderConfig;
    use crate::dispatch::test_support::{Behavior, FakeTransport};
    use crate::dispatch::{Dispatcher, MailTransport, TransportError};
    use crate::messages::MessageStatus;
    use crate::store;
    use std::sync::Arc;

    struct Fixture {
        campaigns: CampaignRepository,
        contacts: ContactRepository,
        messages: MessageRepository,
        campaign_id: i64,
    }

    async fn fixture(pool: &sqlx::SqlitePool) -> Fixture {
        let campaigns = CampaignRepository::new(pool).await.unwrap();
        let contacts = ContactRepository::new(pool).await.unwrap();
        let messages = MessageRepository::new(pool).await.unwrap();
        let campaign = campaigns
            .create(NewCampaign {
                name: "Launch".to_string(),
                subject: "Hi".to_string(),
                from_email: "news@example.com".to_string(),
                html_body: None,
                text_body: Some("hello".to_string()),
            })
            .await
            .unwrap();
        Fixture {
            campaigns,
            contacts,
            messages,
            campaign_id: campaign.id,
        }
    }

    fn sync_queue(fx: &Fixture, transport: Arc<FakeTransport>) -> DispatchQueue {
        DispatchQueue::Synchronous(Arc::new(Dispatcher::new(
            fx.messages.clone(),
            transport as Arc<dyn MailTransport>,
            ProviderConfig::default(),
        )))
    }

    #[tokio::test]
    async fn only_matching_contacts_are_enqueued() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;

        let valid = fx.contacts.ensure("ok@example.com").await.unwrap();
        fx.contacts
            .apply_verdict(valid.id, ContactStatus::Valid, None, None)
            .await
            .unwrap();
        let risky = fx.contacts.ensure("meh@example.com").await.unwrap();
        fx.contacts
            .apply_verdict(risky.id, ContactStatus::Risky, Some("disposable_domain"), None)
            .await
            .unwrap();
        fx.contacts.ensure("new@example.com").await.unwrap();

        let transport = FakeTransport::new(Behavior::Accept);
        let queue = sync_queue(&fx, Arc::clone(&transport));

        let summary = send_campaign(
            &fx.campaigns,
            &fx.contacts,
            &fx.messages,
            &queue,
            fx.campaign_id,
            ContactStatus::Valid,
        )
        .await
        .unwrap();

        assert_eq!(summary, EnqueueSummary { enqueued: 1, failed: 0 });
        let all = fx.messages.list(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].contact_id, valid.id);
        assert_eq!(transport.calls()[0].to, "ok@example.com");
    }

    #[tokio::test]
    async fn unknown_campaign_is_an_input_error() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let queue = sync_queue(&fx, FakeTransport::new(Behavior::Accept));

        let result = send_campaign(
            &fx.campaigns,
            &fx.contacts,
            &fx.messages,
            &queue,
            fx.campaign_id + 99,
            ContactStatus::Valid,
        )
        .await;
        assert!(matches!(result, Err(Error::CampaignNotFound(_))));
    }

    #[tokio::test]
    async fn synchronous_failures_settle_messages_and_continue() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;

        for email in ["a@example.com", "b@example.com"] {
            let contact = fx.contacts.ensure(email).await.unwrap();
            fx.contacts
                .apply_verdict(contact.id, ContactStatus::Valid, None, None)
                .await
                .unwrap();
        }

        let transport = FakeTransport::new(Behavior::Fail(TransportError::Network(
            "outage".to_string(),
        )));
        let queue = sync_queue(&fx, transport);

        let summary = send_campaign(
            &fx.campaigns,
            &fx.contacts,
            &fx.messages,
            &queue,
            fx.campaign_id,
            ContactStatus::Valid,
        )
        .await
        .unwrap();

        assert_eq!(summary, EnqueueSummary { enqueued: 0, failed: 2 });
        let failed = fx.messages.list(Some(MessageStatus::Failed)).await.unwrap();
        assert_eq!(failed.len(), 2);
        // Nothing is ever left queued after a settled attempt.
        assert!(fx.messages.list(Some(MessageStatus::Queued)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_selected_skips_unknown_ids() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;
        let contact = fx.contacts.ensure("ok@example.com").await.unwrap();

        let transport = FakeTransport::new(Behavior::Accept);
        let queue = sync_queue(&fx, Arc::clone(&transport));

        let summary = send_selected(
            &fx.campaigns,
            &fx.contacts,
            &fx.messages,
            &queue,
            fx.campaign_id,
            &[contact.id, contact.id + 50],
        )
        .await
        .unwrap();

        assert_eq!(summary, EnqueueSummary { enqueued: 1, failed: 0 });
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn stats_require_an_existing_campaign() {
        let pool = store::in_memory().await.unwrap();
        let fx = fixture(&pool).await;

        let stats = campaign_stats(&fx.campaigns, &fx.messages, fx.campaign_id)
            .await
            .unwrap();
        assert_eq!(stats, CampaignStats::default());

        let missing = campaign_stats(&fx.campaigns, &fx.messages, fx.campaign_id + 1).await;
        assert!(matches!(missing, Err(Error::CampaignNotFound(_))));
    }
}
