//! Contact storage repository.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{Contact, ContactStatus};
use crate::Result;

/// Repository for contact storage and retrieval.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    /// Attaches to a pool, creating the contacts table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: &SqlitePool) -> Result<Self> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT,
                last_name TEXT,
                status TEXT NOT NULL DEFAULT 'new',
                reason TEXT,
                provider TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_contacts_status ON contacts(status)
            ",
        )
        .execute(pool)
        .await?;

        Ok(Self { pool: pool.clone() })
    }

    /// Inserts a contact or updates the name fields of an existing one.
    ///
    /// The email is normalized to lowercase; an existing row keeps its
    /// status, reason, and provider untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Contact> {
        let email = email.trim().to_lowercase();

        sqlx::query(
            r"
            INSERT INTO contacts (email, first_name, last_name, status, created_at)
            VALUES (?, ?, ?, 'new', ?)
            ON CONFLICT(email) DO UPDATE SET
                first_name = COALESCE(excluded.first_name, contacts.first_name),
                last_name = COALESCE(excluded.last_name, contacts.last_name)
            ",
        )
        .bind(&email)
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.require_by_email(&email).await
    }

    /// Fetches a contact by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: i64) -> Result<Option<Contact>> {
        let row = sqlx::query("SELECT * FROM contacts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| contact_from_row(&row)))
    }

    /// Fetches a contact by (normalized) email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let row = sqlx::query("SELECT * FROM contacts WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| contact_from_row(&row)))
    }

    /// Fetches a contact by email, creating a `new` row if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ensure(&self, email: &str) -> Result<Contact> {
        self.upsert(email, None, None).await
    }

    /// Contacts eligible for bulk validation: never validated, or whose last
    /// verdict left room to improve (`new`, `unknown`, `risky`).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn validation_candidates(&self) -> Result<Vec<Contact>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM contacts
            WHERE status IN ('new', 'unknown', 'risky')
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Lists contacts, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, status: Option<ContactStatus>) -> Result<Vec<Contact>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT * FROM contacts WHERE status = ? ORDER BY id")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM contacts ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Applies a validation verdict to a contact row.
    ///
    /// This is the only write path for status/reason/provider; the engine
    /// never mutates them elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn apply_verdict(
        &self,
        id: i64,
        status: ContactStatus,
        reason: Option<&str>,
        provider: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE contacts SET status = ?, reason = ?, provider = ? WHERE id = ?
            ",
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(provider)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn require_by_email(&self, email: &str) -> Result<Contact> {
        let row = sqlx::query("SELECT * FROM contacts WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(contact_from_row(&row))
    }
}

fn contact_from_row(row: &SqliteRow) -> Contact {
    Contact {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        status: ContactStatus::parse(row.get::<String, _>("status").as_str()),
        reason: row.get("reason"),
        provider: row.get("provider"),
        created_at: row.get("created_at"),
    }
}
