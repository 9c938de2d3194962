use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::record,
    db::DbPool,
    dto::{products::ReviewView, reviews::CreateReviewRequest},
    entity::{
        products::Entity as Products,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        sea_orm_active_enums::OrderStatus,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    // retired products stay reviewable by the people who bought them
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let already = Reviews::find()
        .filter(
            Condition::all()
                .add(ReviewCol::UserId.eq(user.user_id))
                .add(ReviewCol::ProductId.eq(product.id)),
        )
        .count(&state.orm)
        .await?;
    if already > 0 {
        return Err(AppError::Duplicate(
            "You have already reviewed this product".into(),
        ));
    }

    payload.validate()?;

    let is_verified = has_delivered_purchase(&state.pool, user.user_id, product.id).await?;

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product.id),
        rating: Set(payload.rating),
        title: Set(payload.title.trim().to_string()),
        comment: Set(payload
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())),
        is_verified: Set(is_verified),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review submitted",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

/// True when the user has a delivered order containing the product.
async fn has_delivered_purchase(
    pool: &DbPool,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = $3
        )
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(OrderStatus::Delivered.as_str())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Newest first, with the reviewer's display name.
pub(crate) async fn list_for_product<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<Vec<ReviewView>> {
    let rows = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .find_also_related(Users)
        .order_by_desc(ReviewCol::CreatedAt)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(review, reviewer)| ReviewView {
            id: review.id,
            rating: review.rating,
            title: review.title,
            comment: review.comment,
            is_verified: review.is_verified,
            reviewer_name: reviewer.map(|u| u.name).unwrap_or_default(),
            created_at: review.created_at.with_timezone(&chrono::Utc),
        })
        .collect())
}
