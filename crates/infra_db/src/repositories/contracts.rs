//! Contract repository implementation
//!
//! The `quote_id` column carries a UNIQUE constraint, so at most one
//! contract can ever exist per quote, including under concurrent creation
//! attempts; the violation surfaces as `DatabaseError::DuplicateEntry`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::parse_amount;

/// A contract as stored
#[derive(Debug, Clone)]
pub struct ContractRow {
    pub id: String,
    pub quote_id: String,
    pub client_id: String,
    pub asset_type: String,
    pub premium: Decimal,
    pub effective_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: String,
}

/// Data required to insert a contract; status starts as ACTIVE
#[derive(Debug, Clone)]
pub struct NewContract {
    pub id: String,
    pub quote_id: String,
    pub client_id: String,
    pub asset_type: String,
    pub premium: Decimal,
    pub effective_date: DateTime<Utc>,
}

const CONTRACT_COLUMNS: &str =
    "id, quote_id, client_id, asset_type, premium, effective_date, end_date, status";

/// Repository for contract rows
#[derive(Debug, Clone)]
pub struct ContractRepository {
    pool: DatabasePool,
}

impl ContractRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Inserts a new contract in ACTIVE status.
    ///
    /// Returns `DuplicateEntry` when a contract already exists for the quote.
    pub async fn create(&self, contract: &NewContract) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO contracts (id, quote_id, client_id, asset_type, premium, effective_date, status)
            VALUES (?, ?, ?, ?, ?, ?, 'ACTIVE')
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.quote_id)
        .bind(&contract.client_id)
        .bind(&contract.asset_type)
        .bind(contract.premium.to_string())
        .bind(contract.effective_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a contract by id, if present.
    pub async fn get(&self, id: &str) -> Result<Option<ContractRow>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contracts WHERE id = ?",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| scan_contract(&r)).transpose()
    }

    /// The contract issued from a given quote, if any.
    pub async fn find_by_quote(&self, quote_id: &str) -> Result<Option<ContractRow>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contracts WHERE quote_id = ?",
            CONTRACT_COLUMNS
        ))
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| scan_contract(&r)).transpose()
    }

    /// All contracts belonging to a client, newest first.
    pub async fn find_by_client(&self, client_id: &str) -> Result<Vec<ContractRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contracts WHERE client_id = ? ORDER BY effective_date DESC",
            CONTRACT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_contract).collect()
    }

    /// Updates a contract's status.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE contracts SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Contract", id));
        }

        Ok(())
    }

    /// Terminates a contract: sets status and end date in one statement.
    pub async fn terminate(&self, id: &str, end_date: DateTime<Utc>) -> Result<(), DatabaseError> {
        let result =
            sqlx::query("UPDATE contracts SET status = 'TERMINATED', end_date = ? WHERE id = ?")
                .bind(end_date)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Contract", id));
        }

        Ok(())
    }

    /// Paginated scan over all contracts, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ContractRow>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contracts ORDER BY effective_date DESC LIMIT ? OFFSET ?",
            CONTRACT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_contract).collect()
    }

    /// Total number of contracts.
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM contracts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }

    /// Number of contracts in the given status.
    pub async fn count_by_status(&self, status: &str) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM contracts WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }
}

fn scan_contract(row: &SqliteRow) -> Result<ContractRow, DatabaseError> {
    let premium: String = row.try_get("premium")?;

    Ok(ContractRow {
        id: row.try_get("id")?,
        quote_id: row.try_get("quote_id")?,
        client_id: row.try_get("client_id")?,
        asset_type: row.try_get("asset_type")?,
        premium: parse_amount("premium", &premium)?,
        effective_date: row.try_get("effective_date")?,
        end_date: row.try_get("end_date")?,
        status: row.try_get("status")?,
    })
}
