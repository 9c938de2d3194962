use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub product_count: i64,
    pub active_product_count: i64,
    pub low_stock_count: i64,
    pub order_count: i64,
    pub orders_by_status: Vec<StatusCount>,
    /// Sum of totals across orders that were not cancelled.
    #[schema(value_type = String)]
    pub revenue: Decimal,
}
