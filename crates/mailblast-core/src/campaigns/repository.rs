//! Campaign storage repository.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{Campaign, NewCampaign};
use crate::Result;

/// Repository for campaign storage and retrieval.
#[derive(Debug, Clone)]
pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    /// Attaches to a pool, creating the campaigns table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: &SqlitePool) -> Result<Self> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS campaigns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                subject TEXT NOT NULL,
                from_email TEXT NOT NULL,
                html_body TEXT,
                text_body TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(pool)
        .await?;

        Ok(Self { pool: pool.clone() })
    }

    /// Creates a campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn create(&self, new: NewCampaign) -> Result<Campaign> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO campaigns (name, subject, from_email, html_body, text_body, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&new.name)
        .bind(&new.subject)
        .bind(&new.from_email)
        .bind(&new.html_body)
        .bind(&new.text_body)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Campaign {
            id: result.last_insert_rowid(),
            name: new.name,
            subject: new.subject,
            from_email: new.from_email,
            html_body: new.html_body,
            text_body: new.text_body,
            created_at,
        })
    }

    /// Fetches a campaign by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: i64) -> Result<Option<Campaign>> {
        let row = sqlx::query("SELECT * FROM campaigns WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| campaign_from_row(&row)))
    }
}

fn campaign_from_row(row: &SqliteRow) -> Campaign {
    Campaign {
        id: row.get("id"),
        name: row.get("name"),
        subject: row.get("subject"),
        from_email: row.get("from_email"),
        html_body: row.get("html_body"),
        text_body: row.get("text_body"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store;

    #[tokio::test]
    async fn create_and_fetch() {
        let pool = store::in_memory().await.unwrap();
        let repo = CampaignRepository::new(&pool).await.unwrap();

        let campaign = repo
            .create(NewCampaign {
                name: "Launch".to_string(),
                subject: "We are live".to_string(),
                from_email: "news@example.com".to_string(),
                html_body: Some("<p>Hello</p>".to_string()),
                text_body: None,
            })
            .await
            .unwrap();

        let fetched = repo.get(campaign.id).await.unwrap().unwrap();
        assert_eq!(fetched, campaign);
        assert!(repo.get(campaign.id + 1).await.unwrap().is_none());
    }
}
