//! Quote repository implementation
//!
//! Database access for the quotation service: quote creation, status flips
//! and the expiry scan backing the background sweep.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::parse_amount;

/// A quote as stored
#[derive(Debug, Clone)]
pub struct QuoteRow {
    pub id: String,
    pub client_id: String,
    pub asset_type: String,
    pub asset_value: Decimal,
    pub premium: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: String,
}

/// Data required to insert a quote; status starts as GENERATED
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub id: String,
    pub client_id: String,
    pub asset_type: String,
    pub asset_value: Decimal,
    pub premium: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

const QUOTE_COLUMNS: &str =
    "id, client_id, asset_type, asset_value, premium, created_at, expires_at, status";

/// Repository for quote rows
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: DatabasePool,
}

impl QuoteRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Inserts a new quote in GENERATED status.
    pub async fn create(&self, quote: &NewQuote) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO quotes (id, client_id, asset_type, asset_value, premium, created_at, expires_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'GENERATED')
            "#,
        )
        .bind(&quote.id)
        .bind(&quote.client_id)
        .bind(&quote.asset_type)
        .bind(quote.asset_value.to_string())
        .bind(quote.premium.to_string())
        .bind(quote.created_at)
        .bind(quote.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a quote by id, if present.
    pub async fn get(&self, id: &str) -> Result<Option<QuoteRow>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT {} FROM quotes WHERE id = ?", QUOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| scan_quote(&r)).transpose()
    }

    /// All quotes belonging to a client, newest first.
    pub async fn find_by_client(&self, client_id: &str) -> Result<Vec<QuoteRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM quotes WHERE client_id = ? ORDER BY created_at DESC",
            QUOTE_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_quote).collect()
    }

    /// Quotes past their expiration still in GENERATED status.
    pub async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<QuoteRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM quotes WHERE expires_at < ? AND status = 'GENERATED' ORDER BY expires_at ASC",
            QUOTE_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_quote).collect()
    }

    /// Updates a quote's status.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE quotes SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Quote", id));
        }

        Ok(())
    }

    /// Paginated scan over all quotes, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<QuoteRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM quotes ORDER BY created_at DESC LIMIT ? OFFSET ?",
            QUOTE_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_quote).collect()
    }

    /// Total number of quotes.
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quotes")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }

    /// Number of quotes in the given status.
    pub async fn count_by_status(&self, status: &str) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quotes WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }
}

fn scan_quote(row: &SqliteRow) -> Result<QuoteRow, DatabaseError> {
    let asset_value: String = row.try_get("asset_value")?;
    let premium: String = row.try_get("premium")?;

    Ok(QuoteRow {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        asset_type: row.try_get("asset_type")?,
        asset_value: parse_amount("asset_value", &asset_value)?,
        premium: parse_amount("premium", &premium)?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        status: row.try_get("status")?,
    })
}
