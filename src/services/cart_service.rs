use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::record,
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
    entity::{
        cart_items::{
            ActiveModel as CartActive, Column as CartCol, Entity as CartItems,
            Model as CartItemModel,
        },
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, ProductSummary},
    pricing::line_total,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items: Vec<CartItemDto> = rows
        .into_iter()
        .filter_map(|(item, product)| {
            let product = product?;
            Some(CartItemDto {
                id: item.id,
                line_total: line_total(product.price, item.quantity),
                quantity: item.quantity,
                product: ProductSummary::from(product),
            })
        })
        .collect();
    let subtotal = items.iter().map(|item| item.line_total).sum();

    Ok(ApiResponse::ok(CartList { items, subtotal }))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let quantity = payload.quantity.unwrap_or(1);
    ensure_positive(quantity)?;

    let product = find_active_product(state, payload.product_id).await?;

    let item = match merge_cart_line(state, user, &product, quantity).await {
        // a concurrent first add won the insert; fold this one into its row
        Err(AppError::Duplicate(_)) => merge_cart_line(state, user, &product, quantity).await?,
        other => other?,
    };

    record(
        &state.pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": item.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        CartItem::from(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_positive(payload.quantity)?;

    let (item, product) = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(item_id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .find_also_related(Products)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;
    let product = product.ok_or(AppError::NotFound("Product"))?;
    ensure_in_stock(&product, payload.quantity)?;

    let mut active: CartActive = item.into();
    active.quantity = Set(payload.quantity);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Cart updated",
        CartItem::from(item),
        Some(Meta::empty()),
    ))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(item_id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    record(
        &state.pool,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Adds `quantity` to the caller's line for `product`, creating the line if needed.
async fn merge_cart_line(
    state: &AppState,
    user: &AuthUser,
    product: &ProductModel,
    quantity: i32,
) -> AppResult<CartItemModel> {
    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product.id)),
        )
        .one(&state.orm)
        .await?;

    let item = match existing {
        Some(item) => {
            let wanted = item.quantity.saturating_add(quantity);
            ensure_in_stock(product, wanted)?;
            let mut active: CartActive = item.into();
            active.quantity = Set(wanted);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            ensure_in_stock(product, quantity)?;
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                quantity: Set(quantity),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };
    Ok(item)
}

pub(crate) async fn find_active_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound("Product"))
}

fn ensure_positive(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn ensure_in_stock(product: &ProductModel, wanted: i32) -> AppResult<()> {
    if wanted > product.stock {
        return Err(AppError::InsufficientStock {
            product_id: product.id,
            available: product.stock,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{ensure_in_stock, ensure_positive};
    use crate::{entity::products::Model, error::AppError};

    fn product(stock: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Round Metal".into(),
            slug: "round-metal".into(),
            description: None,
            price: Decimal::new(15400, 2),
            compare_price: None,
            sku: None,
            stock,
            images: serde_json::json!([]),
            is_active: true,
            is_featured: false,
            category_id: None,
            brand_id: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn quantity_below_one_is_rejected() {
        assert!(matches!(ensure_positive(0), Err(AppError::BadRequest(_))));
        assert!(ensure_positive(1).is_ok());
    }

    #[test]
    fn stock_cap_reports_availability() {
        let p = product(3);
        assert!(ensure_in_stock(&p, 3).is_ok());
        match ensure_in_stock(&p, 4) {
            Err(AppError::InsufficientStock {
                product_id,
                available,
            }) => {
                assert_eq!(product_id, p.id);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
