use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::record,
    dto::wishlist::{WishlistCheck, WishlistEntry, WishlistList, WishlistRemoval, WishlistRequest},
    entity::{
        products::Entity as Products,
        wishlist_items::{ActiveModel as WishlistActive, Column as WishCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ProductSummary, WishlistItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistList>> {
    let items = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(WishCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(entry, product)| {
            Some(WishlistEntry {
                id: entry.id,
                product: ProductSummary::from(product?),
                created_at: entry.created_at.with_timezone(&chrono::Utc),
            })
        })
        .collect();

    Ok(ApiResponse::ok(WishlistList { items }))
}

pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: WishlistRequest,
) -> AppResult<ApiResponse<WishlistItem>> {
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    if is_wishlisted(state, user.user_id, product.id).await? {
        return Err(AppError::Duplicate("Product already in wishlist".into()));
    }

    let entry = WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        user.user_id,
        "wishlist_add",
        "wishlist_items",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to wishlist",
        WishlistItem::from(entry),
        Some(Meta::empty()),
    ))
}

/// Removing something that is not there is not an error.
pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: WishlistRequest,
) -> AppResult<ApiResponse<WishlistRemoval>> {
    let result = WishlistItems::delete_many()
        .filter(
            Condition::all()
                .add(WishCol::UserId.eq(user.user_id))
                .add(WishCol::ProductId.eq(payload.product_id)),
        )
        .exec(&state.orm)
        .await?;

    let removed = result.rows_affected > 0;
    if removed {
        record(
            &state.pool,
            user.user_id,
            "wishlist_remove",
            "wishlist_items",
            serde_json::json!({ "product_id": payload.product_id }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        WishlistRemoval { removed },
        Some(Meta::empty()),
    ))
}

pub async fn check_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistCheck>> {
    let in_wishlist = is_wishlisted(state, user.user_id, product_id).await?;
    Ok(ApiResponse::ok(WishlistCheck { in_wishlist }))
}

async fn is_wishlisted(state: &AppState, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
    let count = WishlistItems::find()
        .filter(
            Condition::all()
                .add(WishCol::UserId.eq(user_id))
                .add(WishCol::ProductId.eq(product_id)),
        )
        .count(&state.orm)
        .await?;
    Ok(count > 0)
}
