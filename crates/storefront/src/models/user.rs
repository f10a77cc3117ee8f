//! User and profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aperture_core::{Email, ProfileId, UserId};

/// A storefront user, supplied by the identity provider.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// One-to-one extension of a user holding payment processor state.
///
/// Created in the same transaction as the user row, so every user has
/// exactly one profile at all times after creation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    /// Opaque reusable billing profile reference at the processor.
    pub processor_customer_ref: Option<String>,
    /// Whether the user opted into charging a stored card.
    pub remembers_card: bool,
}

impl Profile {
    /// The stored customer reference, treating the empty string as absent.
    #[must_use]
    pub fn customer_ref(&self) -> Option<&str> {
        self.processor_customer_ref
            .as_deref()
            .filter(|r| !r.is_empty())
    }
}

/// The authenticated user as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_ref_empty_string_is_absent() {
        let profile = Profile {
            id: ProfileId::new(1),
            user_id: UserId::new(1),
            processor_customer_ref: Some(String::new()),
            remembers_card: false,
        };
        assert_eq!(profile.customer_ref(), None);
    }

    #[test]
    fn test_customer_ref_present() {
        let profile = Profile {
            id: ProfileId::new(1),
            user_id: UserId::new(1),
            processor_customer_ref: Some("cus_123".to_owned()),
            remembers_card: true,
        };
        assert_eq!(profile.customer_ref(), Some("cus_123"));
    }
}
