use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A redeemable code that credits a fixed amount to whoever activates it,
/// up to a usage cap and optional expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Promocode {
    pub code: String,
    pub amount: i64,
    pub max_uses: i32,
    pub used_count: i32,
    pub created_by: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Promocode {
    pub fn remaining_uses(&self) -> i32 {
        self.max_uses - self.used_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.max_uses
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }

    /// Active iff uses remain and the code has not expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_exhausted() && !self.is_expired(now)
    }
}

/// Read-only view of a promocode with its derived redemption state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromocodeInfo {
    pub code: String,
    pub amount: i64,
    pub max_uses: i32,
    pub used_count: i32,
    pub remaining_uses: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PromocodeInfo {
    pub fn from_promocode(promocode: &Promocode, now: DateTime<Utc>) -> Self {
        Self {
            code: promocode.code.clone(),
            amount: promocode.amount,
            max_uses: promocode.max_uses,
            used_count: promocode.used_count,
            remaining_uses: promocode.remaining_uses(),
            is_active: promocode.is_active(now),
            expires_at: promocode.expires_at,
        }
    }
}

/// What the issuer gets back from minting a code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedPromocode {
    pub code: String,
    pub amount: i64,
    pub max_uses: i32,
    pub remaining_uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
}
