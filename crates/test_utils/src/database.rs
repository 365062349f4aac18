//! In-memory database setup for tests

use infra_db::{create_memory_pool, init_schema, DatabasePool};

/// Creates a fresh in-memory SQLite database with the full schema applied.
///
/// Each call returns an isolated database, so tests never share state.
pub async fn test_pool() -> DatabasePool {
    let pool = create_memory_pool()
        .await
        .expect("failed to open in-memory database");
    init_schema(&pool).await.expect("failed to apply schema");
    pool
}
