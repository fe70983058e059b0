//! Message storage repository.
//!
//! Terminal transitions are conditional UPDATEs guarded on
//! `status = 'queued'`: whichever writer lands first wins and every later
//! attempt observes zero affected rows. That guard is what makes dispatch
//! exactly-once under concurrent enqueues.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{CampaignStats, DispatchContext, Message, MessageStatus};
use crate::error::Error;
use crate::Result;

/// Repository for message storage and status transitions.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Attaches to a pool, creating the messages table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: &SqlitePool) -> Result<Self> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id INTEGER NOT NULL,
                contact_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'queued',
                error TEXT,
                sent_at TEXT
            )
            ",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_campaign ON messages(campaign_id)
            ",
        )
        .execute(pool)
        .await?;

        Ok(Self { pool: pool.clone() })
    }

    /// Creates a `queued` message for a campaign × recipient pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn create_queued(&self, campaign_id: i64, contact_id: i64) -> Result<Message> {
        let result = sqlx::query(
            r"
            INSERT INTO messages (campaign_id, contact_id, status) VALUES (?, ?, 'queued')
            ",
        )
        .bind(campaign_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            campaign_id,
            contact_id,
            status: MessageStatus::Queued,
            error: None,
            sent_at: None,
        })
    }

    /// Fetches a message by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| message_from_row(&row)))
    }

    /// Loads a message joined with its campaign content and recipient.
    ///
    /// Returns `Ok(None)` when the message does not exist (dispatch treats
    /// that as a handled no-op).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DanglingMessage`] if the message exists but its
    /// campaign or contact has been removed.
    pub async fn load_dispatch(&self, id: i64) -> Result<Option<DispatchContext>> {
        let Some(message) = self.get(id).await? else {
            return Ok(None);
        };

        let row = sqlx::query(
            r"
            SELECT c.email AS recipient,
                   k.subject AS subject,
                   k.from_email AS from_email,
                   k.html_body AS html_body,
                   k.text_body AS text_body
            FROM messages m
            JOIN campaigns k ON k.id = m.campaign_id
            JOIN contacts c ON c.id = m.contact_id
            WHERE m.id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(Error::DanglingMessage(
                id,
                "campaign or contact removed".to_string(),
            ));
        };

        Ok(Some(DispatchContext {
            message,
            recipient: row.get("recipient"),
            subject: row.get("subject"),
            from_email: row.get("from_email"),
            html_body: row.get("html_body"),
            text_body: row.get("text_body"),
        }))
    }

    /// Transitions `queued` → `sent`, recording the timestamp.
    ///
    /// Returns `false` if the message was not in `queued` (already handled).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE messages SET status = 'sent', sent_at = ?, error = NULL
            WHERE id = ? AND status = 'queued'
            ",
        )
        .bind(sent_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Transitions `queued` → `failed` with a diagnostic.
    ///
    /// Returns `false` if the message was not in `queued` (already handled).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_failed(&self, id: i64, error: &str) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE messages SET status = 'failed', error = ?
            WHERE id = ? AND status = 'queued'
            ",
        )
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Lists messages, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, status: Option<MessageStatus>) -> Result<Vec<Message>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT * FROM messages WHERE status = ? ORDER BY id")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM messages ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.iter().map(message_from_row).collect())
    }

    /// Delivery counters for one campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self, campaign_id: i64) -> Result<CampaignStats> {
        let rows = sqlx::query(
            r"
            SELECT status, COUNT(*) AS n FROM messages
            WHERE campaign_id = ? GROUP BY status
            ",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = CampaignStats::default();
        for row in rows {
            let n: i64 = row.get("n");
            match MessageStatus::parse(row.get::<String, _>("status").as_str()) {
                MessageStatus::Queued => stats.queued = n,
                MessageStatus::Sent => stats.sent = n,
                MessageStatus::Failed => stats.failed = n,
            }
        }
        Ok(stats)
    }
}

fn message_from_row(row: &SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        campaign_id: row.get("campaign_id"),
        contact_id: row.get("contact_id"),
        status: MessageStatus::parse(row.get::<String, _>("status").as_str()),
        error: row.get("error"),
        sent_at: row.get("sent_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::campaigns::{CampaignRepository, NewCampaign};
    use crate::contacts::ContactRepository;
    use crate::store;

    async fn fixtures(pool: &SqlitePool) -> (i64, i64, MessageRepository) {
        let contacts = ContactRepository::new(pool).await.unwrap();
        let campaigns = CampaignRepository::new(pool).await.unwrap();
        let messages = MessageRepository::new(pool).await.unwrap();

        let contact = contacts.ensure("alice@example.com").await.unwrap();
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
        (campaign.id, contact.id, messages)
    }

    #[tokio::test]
    async fn load_dispatch_joins_content() {
        let pool = store::in_memory().await.unwrap();
        let (campaign_id, contact_id, messages) = fixtures(&pool).await;
        let message = messages.create_queued(campaign_id, contact_id).await.unwrap();

        let ctx = messages.load_dispatch(message.id).await.unwrap().unwrap();
        assert_eq!(ctx.recipient, "alice@example.com");
        assert_eq!(ctx.from_email, "news@example.com");
        assert_eq!(ctx.text_body.as_deref(), Some("hello"));

        assert!(messages.load_dispatch(message.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn terminal_transition_happens_once() {
        let pool = store::in_memory().await.unwrap();
        let (campaign_id, contact_id, messages) = fixtures(&pool).await;
        let message = messages.create_queued(campaign_id, contact_id).await.unwrap();

        assert!(messages.mark_sent(message.id, Utc::now()).await.unwrap());
        // Second transition attempt loses the guard.
        assert!(!messages.mark_sent(message.id, Utc::now()).await.unwrap());
        assert!(!messages.mark_failed(message.id, "late failure").await.unwrap());

        let row = messages.get(message.id).await.unwrap().unwrap();
        assert_eq!(row.status, MessageStatus::Sent);
        assert!(row.sent_at.is_some());
        assert!(row.error.is_none());
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let pool = store::in_memory().await.unwrap();
        let (campaign_id, contact_id, messages) = fixtures(&pool).await;

        let a = messages.create_queued(campaign_id, contact_id).await.unwrap();
        let b = messages.create_queued(campaign_id, contact_id).await.unwrap();
        messages.create_queued(campaign_id, contact_id).await.unwrap();

        messages.mark_sent(a.id, Utc::now()).await.unwrap();
        messages.mark_failed(b.id, "smtp: 554 blocked").await.unwrap();

        let stats = messages.stats(campaign_id).await.unwrap();
        assert_eq!(stats, CampaignStats { queued: 1, sent: 1, failed: 1 });
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let pool = store::in_memory().await.unwrap();
        let (campaign_id, contact_id, messages) = fixtures(&pool).await;

        let a = messages.create_queued(campaign_id, contact_id).await.unwrap();
        messages.create_queued(campaign_id, contact_id).await.unwrap();
        messages.mark_failed(a.id, "provider: outage").await.unwrap();

        let failed = messages.list(Some(MessageStatus::Failed)).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("provider: outage"));
    }
}
