use crate::error::{AppError, Result};
use crate::models::Balance;
use sqlx::{PgConnection, PgPool};

/// Repository for balance rows. Pool-level methods serve plain reads;
/// the associated functions over `PgConnection` are the row-locking
/// operations and must run inside an open database transaction.
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the user's balance, inserting a zero row when absent.
    /// Insert-or-ignore semantics make this safe to call concurrently.
    pub async fn get_or_create(&self, user_id: &str) -> Result<Balance> {
        sqlx::query(
            r#"
            INSERT INTO balances (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let row = sqlx::query_as::<_, Balance>(
            r#"
            SELECT user_id, amount, currency, updated_at
            FROM balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a balance without creating it.
    pub async fn find(&self, user_id: &str) -> Result<Option<Balance>> {
        let row = sqlx::query_as::<_, Balance>(
            r#"
            SELECT user_id, amount, currency, updated_at
            FROM balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Locks the user's balance row and returns its amount. Blocks until
    /// any holder of the row lock commits or rolls back.
    pub async fn lock_for_update(conn: &mut PgConnection, user_id: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT amount FROM balances WHERE user_id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| r.0))
    }

    /// Locks the balance row, creating a zero row first when absent. The
    /// freshly inserted row is already protected by the insert within the
    /// surrounding transaction.
    pub async fn lock_or_create(conn: &mut PgConnection, user_id: &str) -> Result<i64> {
        if let Some(amount) = Self::lock_for_update(conn, user_id).await? {
            return Ok(amount);
        }

        sqlx::query(
            r#"
            INSERT INTO balances (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        // A concurrent insert may have won the race; re-read under lock.
        let amount = Self::lock_for_update(conn, user_id).await?.unwrap_or(0);
        Ok(amount)
    }

    /// Unconditional overwrite. Callers must have validated the new amount
    /// with the checked ledger arithmetic beforehand.
    pub async fn set_amount(conn: &mut PgConnection, user_id: &str, amount: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE balances
            SET amount = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
