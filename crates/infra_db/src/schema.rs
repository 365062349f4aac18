//! Schema bootstrap
//!
//! Creates the per-entity tables with their CHECK constraints, plus the
//! `events_log` audit table that records every published notification. Each
//! service only touches the tables it owns, but the schema is shared so the
//! lab can also run everything against a single database file.

use crate::error::DatabaseError;
use crate::pool::DatabasePool;

const SCHEMA: &str = r#"
-- Quotes
CREATE TABLE IF NOT EXISTS quotes (
    id              TEXT PRIMARY KEY,
    client_id       TEXT NOT NULL,
    asset_type      TEXT NOT NULL CHECK (asset_type IN ('AUTO', 'HOME', 'OTHER')),
    asset_value     TEXT NOT NULL,
    premium         TEXT NOT NULL,
    created_at      DATETIME NOT NULL,
    expires_at      DATETIME NOT NULL,
    status          TEXT NOT NULL DEFAULT 'GENERATED'
                    CHECK (status IN ('GENERATED', 'CONVERTED', 'EXPIRED'))
);

CREATE INDEX IF NOT EXISTS idx_quotes_client_id ON quotes(client_id);
CREATE INDEX IF NOT EXISTS idx_quotes_status ON quotes(status);
CREATE INDEX IF NOT EXISTS idx_quotes_expires_at ON quotes(expires_at);

-- Contracts
CREATE TABLE IF NOT EXISTS contracts (
    id              TEXT PRIMARY KEY,
    quote_id        TEXT NOT NULL UNIQUE,
    client_id       TEXT NOT NULL,
    asset_type      TEXT NOT NULL CHECK (asset_type IN ('AUTO', 'HOME', 'OTHER')),
    premium         TEXT NOT NULL,
    effective_date  DATETIME NOT NULL,
    end_date        DATETIME,
    status          TEXT NOT NULL DEFAULT 'ACTIVE'
                    CHECK (status IN ('ACTIVE', 'MODIFIED', 'TERMINATED'))
);

CREATE INDEX IF NOT EXISTS idx_contracts_client_id ON contracts(client_id);
CREATE INDEX IF NOT EXISTS idx_contracts_status ON contracts(status);

-- Claims
CREATE TABLE IF NOT EXISTS claims (
    id                  TEXT PRIMARY KEY,
    contract_id         TEXT NOT NULL,
    claim_type          TEXT NOT NULL
                        CHECK (claim_type IN ('THEFT', 'FIRE', 'WATER_DAMAGE', 'ACCIDENT', 'OTHER')),
    description         TEXT,
    estimated_amount    TEXT NOT NULL,
    assessed_amount     TEXT,
    indemnified_amount  TEXT,
    occurred_at         DATETIME NOT NULL,
    declared_at         DATETIME NOT NULL,
    assessed_at         DATETIME,
    paid_at             DATETIME,
    status              TEXT NOT NULL DEFAULT 'DECLARED'
                        CHECK (status IN ('DECLARED', 'EVALUATED', 'INDEMNIFIED', 'REJECTED'))
);

CREATE INDEX IF NOT EXISTS idx_claims_contract_id ON claims(contract_id);
CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status);

-- Audit log of published event notifications
CREATE TABLE IF NOT EXISTS events_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id    TEXT NOT NULL UNIQUE,
    event_type  TEXT NOT NULL,
    source      TEXT NOT NULL,
    payload     TEXT NOT NULL,
    created_at  DATETIME NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_log_type ON events_log(event_type);
CREATE INDEX IF NOT EXISTS idx_events_log_created_at ON events_log(created_at);
"#;

/// Creates all tables and indexes if they do not yet exist.
pub async fn init_schema(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::SchemaFailed(e.to_string()))?;
    Ok(())
}
