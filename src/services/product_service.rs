use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::record,
    dto::products::{
        CreateProductRequest, ProductDetail, ProductList, RatingSummary, UpdateProductRequest,
    },
    entity::{
        brands::Entity as Brands,
        categories::{Column as CategoryCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Brand, Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::review_service::list_for_product,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(slug) = query.category.as_deref().filter(|s| !s.is_empty()) {
        let category = Categories::find()
            .filter(CategoryCol::Slug.eq(slug))
            .one(&state.orm)
            .await?;
        match category {
            Some(category) => condition = condition.add(Column::CategoryId.eq(category.id)),
            None => {
                let meta = Meta::new(page, limit, 0);
                return Ok(ApiResponse::success(
                    "Products",
                    ProductList { items: Vec::new() },
                    Some(meta),
                ));
            }
        }
    }

    if let Some(brand_id) = query.brand {
        condition = condition.add(Column::BrandId.eq(brand_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::Name) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    // stable paging when the sort key ties
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(
            Condition::all()
                .add(Column::Slug.eq(slug))
                .add(Column::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let category = match product.category_id {
        Some(id) => Categories::find_by_id(id)
            .one(&state.orm)
            .await?
            .map(Category::from),
        None => None,
    };
    let brand = match product.brand_id {
        Some(id) => Brands::find_by_id(id).one(&state.orm).await?.map(Brand::from),
        None => None,
    };

    let reviews = list_for_product(&state.orm, product.id).await?;
    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();

    let detail = ProductDetail {
        product: Product::from(product),
        category,
        brand,
        rating: RatingSummary::from_ratings(&ratings),
        reviews,
    };
    Ok(ApiResponse::success("Product", detail, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    ensure_slug_free(state, &payload.slug).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        description: Set(payload.description),
        price: Set(payload.price),
        compare_price: Set(payload.compare_price),
        sku: Set(payload.sku),
        stock: Set(payload.stock),
        images: Set(serde_json::json!(payload.images)),
        is_active: Set(payload.is_active),
        is_featured: Set(payload.is_featured),
        category_id: Set(payload.category_id),
        brand_id: Set(payload.brand_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "slug": product.slug }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_by_slug(state, slug).await?;

    if let Some(new_slug) = payload.slug.as_deref().filter(|s| *s != existing.slug) {
        ensure_slug_free(state, new_slug).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(compare_price) = payload.compare_price {
        active.compare_price = Set(Some(compare_price));
    }
    if let Some(sku) = payload.sku {
        active.sku = Set(Some(sku));
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Products that appear on past orders are deactivated rather than deleted.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = find_by_slug(state, slug).await?;
    let product_id = existing.id;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(product_id))
        .count(&state.orm)
        .await?
        > 0;

    if ordered {
        let mut active: ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
    } else {
        Products::delete_by_id(product_id).exec(&state.orm).await?;
    }

    record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": product_id, "deactivated": ordered }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "deactivated": ordered }),
        Some(Meta::empty()),
    ))
}

async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<ProductModel> {
    Products::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

async fn ensure_slug_free(state: &AppState, slug: &str) -> AppResult<()> {
    let taken = Products::find()
        .filter(Column::Slug.eq(slug))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Duplicate(format!("Slug '{slug}' is already in use")));
    }
    Ok(())
}

/// `%search%` for ILIKE, with the caller's own wildcards matched literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(contains_pattern("aviator"), "%aviator%");
        assert_eq!(contains_pattern("100%"), r"%100\%%");
        assert_eq!(contains_pattern("cat_eye"), r"%cat\_eye%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
