//! Claim repository implementation
//!
//! Covers declaration through assessment and payout. The `assess` and
//! `settle` updates are guarded by the expected current status in the WHERE
//! clause, so amounts and their timestamps are only ever written once even
//! when a manual call races the background sweep.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::{parse_amount, parse_opt_amount};

/// A claim as stored
#[derive(Debug, Clone)]
pub struct ClaimRow {
    pub id: String,
    pub contract_id: String,
    pub claim_type: String,
    pub description: Option<String>,
    pub estimated_amount: Decimal,
    pub assessed_amount: Option<Decimal>,
    pub indemnified_amount: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
    pub declared_at: DateTime<Utc>,
    pub assessed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: String,
}

/// Data required to insert a claim; status starts as DECLARED
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub id: String,
    pub contract_id: String,
    pub claim_type: String,
    pub description: Option<String>,
    pub estimated_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub declared_at: DateTime<Utc>,
}

const CLAIM_COLUMNS: &str = "id, contract_id, claim_type, description, estimated_amount, \
     assessed_amount, indemnified_amount, occurred_at, declared_at, assessed_at, paid_at, status";

/// Repository for claim rows
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    pool: DatabasePool,
}

impl ClaimRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Inserts a new claim in DECLARED status.
    pub async fn create(&self, claim: &NewClaim) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claims (id, contract_id, claim_type, description, estimated_amount, occurred_at, declared_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'DECLARED')
            "#,
        )
        .bind(&claim.id)
        .bind(&claim.contract_id)
        .bind(&claim.claim_type)
        .bind(&claim.description)
        .bind(claim.estimated_amount.to_string())
        .bind(claim.occurred_at)
        .bind(claim.declared_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a claim by id, if present.
    pub async fn get(&self, id: &str) -> Result<Option<ClaimRow>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT {} FROM claims WHERE id = ?", CLAIM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| scan_claim(&r)).transpose()
    }

    /// All claims filed against a contract, newest first.
    pub async fn find_by_contract(&self, contract_id: &str) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM claims WHERE contract_id = ? ORDER BY declared_at DESC",
            CLAIM_COLUMNS
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_claim).collect()
    }

    /// DECLARED claims whose declaration predates the cutoff.
    pub async fn find_declared_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM claims WHERE status = 'DECLARED' AND declared_at < ? ORDER BY declared_at ASC",
            CLAIM_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_claim).collect()
    }

    /// EVALUATED claims whose assessment predates the cutoff.
    pub async fn find_evaluated_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM claims WHERE status = 'EVALUATED' AND assessed_at < ? ORDER BY assessed_at ASC",
            CLAIM_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_claim).collect()
    }

    /// Records the assessment: DECLARED -> EVALUATED with amount and timestamp.
    pub async fn assess(
        &self,
        id: &str,
        assessed_amount: Decimal,
        assessed_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claims
            SET status = 'EVALUATED', assessed_amount = ?, assessed_at = ?
            WHERE id = ? AND status = 'DECLARED'
            "#,
        )
        .bind(assessed_amount.to_string())
        .bind(assessed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim awaiting assessment", id));
        }

        Ok(())
    }

    /// Records the payout: EVALUATED -> INDEMNIFIED with amount and timestamp.
    pub async fn settle(
        &self,
        id: &str,
        indemnified_amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claims
            SET status = 'INDEMNIFIED', indemnified_amount = ?, paid_at = ?
            WHERE id = ? AND status = 'EVALUATED'
            "#,
        )
        .bind(indemnified_amount.to_string())
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim awaiting payout", id));
        }

        Ok(())
    }

    /// Updates a claim's status.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE claims SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", id));
        }

        Ok(())
    }

    /// Paginated scan over all claims, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM claims ORDER BY declared_at DESC LIMIT ? OFFSET ?",
            CLAIM_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_claim).collect()
    }

    /// Total number of claims.
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM claims")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }

    /// Number of claims in the given status.
    pub async fn count_by_status(&self, status: &str) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM claims WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }

    /// Sum of all indemnified amounts.
    ///
    /// Amounts live in TEXT columns, so the summation happens here rather
    /// than in SQL to stay exact.
    pub async fn total_indemnified(&self) -> Result<Decimal, DatabaseError> {
        let rows = sqlx::query(
            "SELECT indemnified_amount FROM claims WHERE indemnified_amount IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut total = Decimal::ZERO;
        for row in &rows {
            let raw: String = row.try_get("indemnified_amount")?;
            total += parse_amount("indemnified_amount", &raw)?;
        }

        Ok(total)
    }
}

fn scan_claim(row: &SqliteRow) -> Result<ClaimRow, DatabaseError> {
    let estimated: String = row.try_get("estimated_amount")?;
    let assessed: Option<String> = row.try_get("assessed_amount")?;
    let indemnified: Option<String> = row.try_get("indemnified_amount")?;

    Ok(ClaimRow {
        id: row.try_get("id")?,
        contract_id: row.try_get("contract_id")?,
        claim_type: row.try_get("claim_type")?,
        description: row.try_get("description")?,
        estimated_amount: parse_amount("estimated_amount", &estimated)?,
        assessed_amount: parse_opt_amount("assessed_amount", assessed)?,
        indemnified_amount: parse_opt_amount("indemnified_amount", indemnified)?,
        occurred_at: row.try_get("occurred_at")?,
        declared_at: row.try_get("declared_at")?,
        assessed_at: row.try_get("assessed_at")?,
        paid_at: row.try_get("paid_at")?,
        status: row.try_get("status")?,
    })
}
