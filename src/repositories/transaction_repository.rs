use crate::error::{AppError, Result};
use crate::models::{TransactionRecord, TransactionType};
use sqlx::{PgConnection, PgPool};

/// Repository for the append-only transaction log.
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends one log row inside the caller's unit of work and returns its
    /// id. Never fails on business grounds, only on storage failure.
    pub async fn append(
        conn: &mut PgConnection,
        booking_id: Option<i64>,
        user_id: &str,
        amount: i64,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO transactions (booking_id, user_id, amount, transaction_type, status, description)
            VALUES ($1, $2, $3, $4, 'completed', $5)
            RETURNING id
            "#,
        )
        .bind(booking_id)
        .bind(user_id)
        .bind(amount)
        .bind(transaction_type)
        .bind(description)
        .fetch_one(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    /// Lists a user's transactions most-recent-first. The id tiebreak keeps
    /// pagination stable for rows created in the same instant.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, booking_id, user_id, amount, transaction_type, status, description, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Signed sum of all of a user's transaction amounts. For a user whose
    /// funds only ever moved through ledger operations this equals the
    /// current balance.
    pub async fn sum_for_user(&self, user_id: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
            FROM transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    /// Counts rows for a user, optionally restricted to a booking.
    pub async fn count_for_user(&self, user_id: &str, booking_id: Option<i64>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM transactions
            WHERE user_id = $1
              AND ($2::BIGINT IS NULL OR booking_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
