use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entity::sea_orm_active_enums::OrderStatus;

pub const MAX_PER_PAGE: i64 = 100;
pub const DEFAULT_PER_PAGE: i64 = 20;
pub const DEFAULT_PRODUCT_PER_PAGE: i64 = 12;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// `(page, per_page, offset)` with the default page size.
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize_page(self.page, self.per_page, DEFAULT_PER_PAGE)
    }
}

/// Page numbers start at 1; page size is clamped to `1..=MAX_PER_PAGE`.
pub fn normalize_page(page: Option<i64>, per_page: Option<i64>, default: i64) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default).clamp(1, MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);
    (page, per_page, offset)
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

// page/per_page are inlined: serde(flatten) loses number parsing for query strings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive match on name or description.
    pub q: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub brand: Option<uuid::Uuid>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub featured: Option<bool>,
    #[param(value_type = Option<String>)]
    pub sort_by: Option<ProductSortBy>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize_page(self.page, self.per_page, DEFAULT_PRODUCT_PER_PAGE)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<OrderStatus>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize_page(self.page, self.per_page, DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Products with stock at or below this value. Defaults to 5.
    pub threshold: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PRODUCT_PER_PAGE, Pagination, ProductQuery, normalize_page};

    #[test]
    fn page_zero_and_huge_sizes_are_clamped() {
        assert_eq!(normalize_page(Some(0), Some(500), 20), (1, 100, 0));
        assert_eq!(normalize_page(Some(3), Some(0), 20), (3, 1, 2));
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn product_listing_defaults_to_twelve() {
        let query = ProductQuery {
            page: Some(2),
            ..Default::default()
        };
        assert_eq!(
            query.normalize(),
            (2, DEFAULT_PRODUCT_PER_PAGE, DEFAULT_PRODUCT_PER_PAGE)
        );
    }
}
