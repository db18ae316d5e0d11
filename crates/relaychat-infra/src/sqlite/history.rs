//! SQLite history store implementation.
//!
//! Implements `HistoryStore` from `relaychat-core`: raw queries, a private
//! Row struct, reads on the reader pool and writes on the writer pool.

use chrono::Utc;
use relaychat_core::chat::repository::HistoryStore;
use relaychat_types::chat::{ChatTurn, MessageRole};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

pub struct SqliteHistoryStore {
    pool: DatabasePool,
}

impl SqliteHistoryStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ChatTurnRow {
    role: String,
    content: String,
    sequence: i64,
    created_at: String,
}

impl ChatTurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            sequence: row.try_get("sequence")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_turn(self) -> Result<ChatTurn, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(ChatTurn {
            role,
            content: self.content,
            sequence: self.sequence,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl HistoryStore for SqliteHistoryStore {
    async fn get(&self, identity: &Identity) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, sequence, created_at FROM chat_turns
             WHERE identity = ? ORDER BY sequence ASC",
        )
        .bind(identity.storage_key())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in &rows {
            let turn_row = ChatTurnRow::from_row(row).map_err(query_error)?;
            turns.push(turn_row.into_turn()?);
        }
        Ok(turns)
    }

    async fn append(
        &self,
        identity: &Identity,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatTurn, RepositoryError> {
        let key = identity.storage_key();
        let created_at = Utc::now();

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(sequence), 0) + 1 AS next FROM chat_turns WHERE identity = ?",
        )
        .bind(&key)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;
        let sequence: i64 = row.try_get("next").map_err(query_error)?;

        sqlx::query(
            "INSERT INTO chat_turns (identity, sequence, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&key)
        .bind(sequence)
        .bind(role.to_string())
        .bind(content)
        .bind(format_datetime(&created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(ChatTurn {
            role,
            content: content.to_string(),
            sequence,
            created_at,
        })
    }

    async fn clear(&self, identity: &Identity) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chat_turns WHERE identity = ?")
            .bind(identity.storage_key())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(())
    }
}
