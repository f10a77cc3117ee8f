//! Photo listing model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use aperture_core::{PhotoId, UserId};

/// A photo listing in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Photo {
    pub id: PhotoId,
    pub user_id: UserId,
    pub description: String,
    /// Storage path of the uploaded image.
    pub image_path: String,
    /// Crop box applied to the image, as `x,y,width,height`.
    pub crop_box: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    /// Discount price when present, else list price.
    #[must_use]
    pub fn effective_unit_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(price: Decimal, discount: Option<Decimal>) -> Photo {
        Photo {
            id: PhotoId::new(1),
            user_id: UserId::new(1),
            description: "test".to_owned(),
            image_path: "image_repository/test.jpg".to_owned(),
            crop_box: None,
            price,
            discount_price: discount,
            slug: "test".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_without_discount() {
        let p = photo(Decimal::new(10, 0), None);
        assert_eq!(p.effective_unit_price(), Decimal::new(10, 0));
    }

    #[test]
    fn test_effective_price_with_discount() {
        let p = photo(Decimal::new(20, 0), Some(Decimal::new(15, 0)));
        assert_eq!(p.effective_unit_price(), Decimal::new(15, 0));
    }
}
