use crate::error::{AppError, Result};
use crate::models::Promocode;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::{PgConnection, PgPool};

/// Attempts before random code generation gives up.
const CODE_GENERATION_ATTEMPTS: usize = 10;
/// Random bytes per generated code; hex-encodes to 16 characters.
const CODE_BYTES: usize = 8;

/// Repository for promocode rows.
pub struct PromocodeRepository {
    pool: PgPool,
}

impl PromocodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn lookup(&self, code: &str) -> Result<Option<Promocode>> {
        let row = sqlx::query_as::<_, Promocode>(
            r#"
            SELECT code, amount, max_uses, used_count, created_by, expires_at, created_at
            FROM promocodes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn exists(conn: &mut PgConnection, code: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM promocodes WHERE code = $1)
            "#,
        )
        .bind(code)
        .fetch_one(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    /// Locks the promocode row to serialize concurrent redemptions.
    pub async fn lock_and_fetch(conn: &mut PgConnection, code: &str) -> Result<Option<Promocode>> {
        let row = sqlx::query_as::<_, Promocode>(
            r#"
            SELECT code, amount, max_uses, used_count, created_by, expires_at, created_at
            FROM promocodes
            WHERE code = $1
            FOR UPDATE
            "#,
        )
        .bind(code)
        .fetch_optional(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn increment_use(conn: &mut PgConnection, code: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE promocodes
            SET used_count = used_count + 1
            WHERE code = $1
            "#,
        )
        .bind(code)
        .execute(conn)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Inserts a promocode row inside the caller's unit of work. A taken
    /// code maps to a conflict; the primary-key constraint closes the
    /// check-then-insert race window.
    pub async fn insert(
        conn: &mut PgConnection,
        code: &str,
        amount: i64,
        max_uses: i32,
        created_by: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO promocodes (code, amount, max_uses, created_by, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(code)
        .bind(amount)
        .bind(max_uses)
        .bind(created_by)
        .bind(expires_at)
        .execute(conn)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict("promocode already exists".to_string()),
            ),
            Err(err) => Err(AppError::Database(err)),
        }
    }

    /// Generates a 16-character lowercase-hex code not present in the store,
    /// retrying with fresh randomness a bounded number of times. Exhausting
    /// the attempts is a fatal generation failure, distinct from a conflict.
    pub async fn generate_unique_code(conn: &mut PgConnection) -> Result<String> {
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let mut bytes = [0u8; CODE_BYTES];
            rand::thread_rng().fill_bytes(&mut bytes);
            let code = hex::encode(bytes);

            if !Self::exists(conn, &code).await? {
                return Ok(code);
            }
        }
        Err(AppError::CodeGeneration)
    }
}
