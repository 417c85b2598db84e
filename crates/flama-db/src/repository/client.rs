//! # Client Repository
//!
//! Database operations for clients.

use chrono::Utc;
use flama_core::Client;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;

const CLIENT_COLUMNS: &str = "id, name, document, phone, address, is_active, created_at, updated_at";

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Searches active clients by name, phone or document.
    ///
    /// Punctuation typed in a CPF/CNPJ is ignored for the document match.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching clients");

        let digits: String = query.chars().filter(char::is_ascii_digit).collect();

        let clients = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE is_active = 1
              AND (?1 = ''
                   OR name LIKE ?2 ESCAPE '\'
                   OR phone LIKE ?2 ESCAPE '\'
                   OR (?3 <> '' AND document LIKE ?4))
            ORDER BY name
            LIMIT ?5
            "#
        ))
        .bind(query)
        .bind(contains_pattern(query))
        .bind(&digits)
        .bind(format!("{}%", digits))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = clients.len(), "Search returned clients");
        Ok(clients)
    }

    /// Gets a client by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Inserts a client or updates the one with the same ID.
    ///
    /// ## Errors
    /// - `DbError::UniqueViolation` - another client has the same document
    pub async fn upsert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Upserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, document, phone, address, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                document = excluded.document,
                phone = excluded.phone,
                address = excluded.address,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.document)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-deletes a client by setting is_active = false.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting client");

        let result = sqlx::query("UPDATE clients SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{client, test_db};
    use crate::DbError;

    #[tokio::test]
    async fn test_search_by_name_and_document() {
        let db = test_db().await;
        let repo = db.clients();

        repo.upsert(&client("c1", "Maria Souza", Some("12345678909"))).await.unwrap();
        repo.upsert(&client("c2", "João Lima", None)).await.unwrap();

        assert_eq!(repo.search("", 10).await.unwrap().len(), 2);

        let found = repo.search("maria", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c1");

        let found = repo.search("123.456", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c1");

        assert!(repo.search("Pedro", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_document_is_rejected() {
        let db = test_db().await;
        let repo = db.clients();

        repo.upsert(&client("c1", "Maria", Some("12345678909"))).await.unwrap();
        let err = repo
            .upsert(&client("c2", "Outra Maria", Some("12345678909")))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let db = test_db().await;
        let repo = db.clients();
        repo.upsert(&client("c1", "Maria", None)).await.unwrap();

        repo.soft_delete("c1").await.unwrap();

        assert!(repo.search("", 10).await.unwrap().is_empty());
        assert!(repo.get_by_id("c1").await.unwrap().is_some());
    }
}
