//! Payment record model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use aperture_core::{PaymentId, UserId};

/// An immutable record of a successful external charge.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    /// Charge identifier returned by the processor.
    pub charge_ref: String,
    pub user_id: UserId,
    /// Cart total at the time of the charge, in the currency's major unit.
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
