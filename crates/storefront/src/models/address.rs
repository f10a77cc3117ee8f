//! Shipping and billing addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aperture_core::{AddressId, UserId};

/// Whether an address is used for shipping or billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Shipping,
    Billing,
}

impl AddressKind {
    /// The column encoding used in the `address.kind` TEXT column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Billing => "billing",
        }
    }
}

impl std::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipping" => Ok(Self::Shipping),
            "billing" => Ok(Self::Billing),
            other => Err(format!("unknown address kind: {other}")),
        }
    }
}

// Stored as TEXT; delegate the sqlx impls to String.
impl sqlx::Type<sqlx::Postgres> for AddressKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for AddressKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<Self>()?)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for AddressKind {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// A user's shipping or billing address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_address: String,
    pub apartment_address: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    pub zip: String,
    pub kind: AddressKind,
    /// Flagged for automatic reuse during checkout. At most one default per
    /// (user, kind), enforced by a partial unique index.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [AddressKind::Shipping, AddressKind::Billing] {
            assert_eq!(kind.as_str().parse::<AddressKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_kind_unknown() {
        assert!("postal".parse::<AddressKind>().is_err());
    }
}
