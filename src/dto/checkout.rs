use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::addresses::AddressInput;

/// Checkout carries addresses only; prices always come from the catalog.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping_address: AddressInput,
    /// Omit to bill to the shipping address.
    pub billing_address: Option<AddressInput>,
    #[serde(default)]
    pub save_addresses: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub order_number: String,
}
