use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::require_text;
use crate::{
    error::{AppError, AppResult},
    models::{Brand, Category, Product},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub compare_price: Option<Decimal>,
    pub sku: Option<String>,
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
}

fn default_true() -> bool {
    true
}

impl CreateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_text("name", &self.name, 200)?;
        validate_slug(&self.slug)?;
        validate_price(self.price)?;
        if let Some(compare) = self.compare_price {
            validate_price(compare)?;
        }
        validate_stock(self.stock)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub compare_price: Option<Decimal>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name, 200)?;
        }
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(compare) = self.compare_price {
            validate_price(compare)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }
}

/// Lowercase ASCII letters, digits and single dashes.
pub fn validate_slug(slug: &str) -> AppResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= 200
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "slug must be lowercase letters, digits and dashes".into(),
        ))
    }
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if price.scale() > 2 && price != price.round_dp(2) {
        return Err(AppError::BadRequest(
            "price must have at most two decimal places".into(),
        ));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewView {
    pub id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: Option<String>,
    pub is_verified: bool,
    pub reviewer_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingSummary {
    /// `None` when the product has no reviews.
    pub average: Option<f64>,
    pub count: usize,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let count = ratings.len();
        let average = (count > 0).then(|| {
            let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
            let avg = sum as f64 / count as f64;
            (avg * 10.0).round() / 10.0
        });
        Self { average, count }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub rating: RatingSummary,
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandList {
    pub items: Vec<Brand>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::{CreateProductRequest, RatingSummary, UpdateProductRequest, validate_slug};

    fn create(price: &str, stock: i32) -> CreateProductRequest {
        CreateProductRequest {
            name: "Aviator Classic".into(),
            slug: "aviator-classic".into(),
            description: None,
            price: Decimal::from_str(price).unwrap(),
            compare_price: None,
            sku: None,
            stock,
            images: vec![],
            is_active: true,
            is_featured: false,
            category_id: None,
            brand_id: None,
        }
    }

    #[test]
    fn slug_rules() {
        assert!(validate_slug("ray-ban-aviator-2").is_ok());
        assert!(validate_slug("Ray-Ban").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn negative_price_or_stock_rejected() {
        assert!(create("154.00", 25).validate().is_ok());
        assert!(create("-1.00", 25).validate().is_err());
        assert!(create("10.00", -1).validate().is_err());
        assert!(create("10.005", 1).validate().is_err());
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        assert!(UpdateProductRequest::default().validate().is_ok());
        let bad = UpdateProductRequest {
            stock: Some(-5),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rating_summary_rounds_to_one_place() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.3));
        assert_eq!(RatingSummary::from_ratings(&[]).average, None);
    }
}
