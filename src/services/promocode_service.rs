use crate::error::{AppError, Result};
use crate::models::balance::DEFAULT_CURRENCY;
use crate::models::{Balance, Caller, IssuedPromocode, PromocodeInfo, TransactionType};
use crate::observability::mask_user_id;
use crate::repositories::{BalanceRepository, PromocodeRepository, TransactionRepository};
use crate::validation;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

/// Parameters for an admin-minted promocode.
#[derive(Debug, Clone)]
pub struct CreatePromocodeRequest {
    pub amount: i64,
    pub max_uses: i32,
    /// Admin-chosen code; a random one is generated when absent.
    pub code: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Orchestrates promocode minting and redemption.
///
/// Generation and activation move balance and therefore run inside a single
/// database transaction with the affected rows locked; admin creation moves
/// no balance and writes no log row.
pub struct PromocodeService {
    pool: PgPool,
    promocodes: PromocodeRepository,
}

impl PromocodeService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            promocodes: PromocodeRepository::new(pool.clone()),
            pool,
        }
    }

    /// A driver converts personal balance into a transferable single-use
    /// code. Fails with a validation error when the balance cannot cover
    /// `amount`.
    pub async fn generate_promocode(&self, user_id: &str, amount: i64) -> Result<IssuedPromocode> {
        validation::validate_user_id(user_id)?;
        validation::validate_amount(amount)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let balance = BalanceRepository::lock_or_create(&mut tx, user_id).await?;
        if balance < amount {
            return Err(AppError::Validation("insufficient funds".to_string()));
        }

        let new_balance = validation::checked_debit(balance, amount)?;
        BalanceRepository::set_amount(&mut tx, user_id, new_balance).await?;

        let code = PromocodeRepository::generate_unique_code(&mut tx).await?;
        PromocodeRepository::insert(&mut tx, &code, amount, 1, user_id, None).await?;

        TransactionRepository::append(
            &mut tx,
            None,
            user_id,
            -amount,
            TransactionType::PromocodeGenerate,
            &format!("Generated promocode {}", code),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        info!(user = %mask_user_id(user_id), "promocode generated");
        Ok(IssuedPromocode {
            code,
            amount,
            max_uses: 1,
            remaining_uses: 1,
            expires_at: None,
        })
    }

    /// Redeems a code for balance. The promocode row is locked first, so
    /// concurrent redemptions of the same code serialize and the usage cap
    /// holds exactly.
    pub async fn activate_promocode(&self, user_id: &str, code: &str) -> Result<Balance> {
        validation::validate_user_id(user_id)?;
        validation::validate_promo_code(code)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let promocode = PromocodeRepository::lock_and_fetch(&mut tx, code)
            .await?
            .ok_or_else(|| AppError::NotFound("promocode not found".to_string()))?;

        if promocode.is_exhausted() {
            return Err(AppError::Validation(
                "promocode has reached maximum uses".to_string(),
            ));
        }
        if promocode.is_expired(Utc::now()) {
            return Err(AppError::Validation("promocode has expired".to_string()));
        }

        let balance = BalanceRepository::lock_or_create(&mut tx, user_id).await?;
        let new_balance = validation::checked_credit(balance, promocode.amount)?;
        BalanceRepository::set_amount(&mut tx, user_id, new_balance).await?;

        PromocodeRepository::increment_use(&mut tx, code).await?;

        TransactionRepository::append(
            &mut tx,
            None,
            user_id,
            promocode.amount,
            TransactionType::PromocodeActivate,
            &format!("Activated promocode {}", code),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        info!(user = %mask_user_id(user_id), "promocode activated");
        Ok(Balance {
            user_id: user_id.to_string(),
            amount: new_balance,
            currency: DEFAULT_CURRENCY.to_string(),
            updated_at: Utc::now(),
        })
    }

    /// Admin-only minting with a configurable usage cap. Moves no balance
    /// and writes no transaction row.
    pub async fn create_promocode(
        &self,
        caller: &Caller,
        request: CreatePromocodeRequest,
    ) -> Result<IssuedPromocode> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }
        validation::validate_user_id(&caller.user_id)?;
        validation::validate_amount(request.amount)?;
        validation::validate_max_uses(request.max_uses)?;

        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;

        let code = match request.code.as_deref() {
            Some(custom) if !custom.is_empty() => {
                validation::validate_promo_code(custom)?;
                if PromocodeRepository::exists(&mut conn, custom).await? {
                    return Err(AppError::Conflict("promocode already exists".to_string()));
                }
                custom.to_string()
            }
            _ => PromocodeRepository::generate_unique_code(&mut conn).await?,
        };

        PromocodeRepository::insert(
            &mut conn,
            &code,
            request.amount,
            request.max_uses,
            &caller.user_id,
            request.expires_at,
        )
        .await?;

        info!(admin = %mask_user_id(&caller.user_id), "promocode created");
        Ok(IssuedPromocode {
            code,
            amount: request.amount,
            max_uses: request.max_uses,
            remaining_uses: request.max_uses,
            expires_at: request.expires_at,
        })
    }

    /// Read-only lookup with the derived redemption state.
    pub async fn get_promocode(&self, code: &str) -> Result<PromocodeInfo> {
        validation::validate_promo_code(code)?;

        let promocode = self
            .promocodes
            .lookup(code)
            .await?
            .ok_or_else(|| AppError::NotFound("promocode not found".to_string()))?;

        Ok(PromocodeInfo::from_promocode(&promocode, Utc::now()))
    }
}
