use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ProductSummary;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product: ProductSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistList {
    pub items: Vec<WishlistEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistRemoval {
    pub removed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistCheck {
    pub in_wishlist: bool,
}
