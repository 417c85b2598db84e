//! # Deposit Repository
//!
//! Database operations for deposits (stock and sales locations).

use chrono::Utc;
use flama_core::Deposit;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

const DEPOSIT_COLUMNS: &str = "id, name, address, phone, is_active, created_at, updated_at";

/// Repository for deposit database operations.
#[derive(Debug, Clone)]
pub struct DepositRepository {
    pool: SqlitePool,
}

impl DepositRepository {
    /// Creates a new DepositRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DepositRepository { pool }
    }

    /// Lists active deposits ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Deposit>> {
        let deposits = sqlx::query_as::<_, Deposit>(&format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = deposits.len(), "Listed active deposits");
        Ok(deposits)
    }

    /// Gets a deposit by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Deposit>> {
        let deposit = sqlx::query_as::<_, Deposit>(&format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deposit)
    }

    /// Inserts a deposit or updates the one with the same ID.
    ///
    /// `created_at` of an existing row is kept.
    pub async fn upsert(&self, deposit: &Deposit) -> DbResult<()> {
        debug!(id = %deposit.id, "Upserting deposit");

        sqlx::query(
            r#"
            INSERT INTO deposits (id, name, address, phone, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                phone = excluded.phone,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&deposit.id)
        .bind(&deposit.name)
        .bind(&deposit.address)
        .bind(&deposit.phone)
        .bind(deposit.is_active)
        .bind(deposit.created_at)
        .bind(deposit.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-deletes a deposit by setting is_active = false.
    ///
    /// Orders and pricing rules keep referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting deposit");

        let result = sqlx::query("UPDATE deposits SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Deposit", id));
        }

        Ok(())
    }

    /// Counts active deposits.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deposits WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
