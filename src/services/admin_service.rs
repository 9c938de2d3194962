use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::record,
    dto::{
        admin::{DashboardStats, InventoryAdjustRequest, LowStockList, StatusCount},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
    },
    entity::{
        orders::{ActiveModel as OrderActive, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        sea_orm_active_enums::OrderStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Product},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, normalize_page, DEFAULT_PER_PAGE},
    services::order_service::{list_matching, with_details},
    state::AppState,
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let (product_count, active_product_count, low_stock_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE is_active),
               COUNT(*) FILTER (WHERE is_active AND stock <= $1)
        FROM products
        "#,
    )
    .bind(DEFAULT_LOW_STOCK_THRESHOLD)
    .fetch_one(&state.pool)
    .await?;

    let by_status: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status")
            .fetch_all(&state.pool)
            .await?;

    let (revenue,): (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0) FROM orders WHERE status <> $1",
    )
    .bind(OrderStatus::Cancelled.as_str())
    .fetch_one(&state.pool)
    .await?;

    let order_count = by_status.iter().map(|(_, count)| count).sum();
    let stats = DashboardStats {
        product_count,
        active_product_count,
        low_stock_count,
        order_count,
        orders_by_status: by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        revenue,
    };
    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list_matching(state, Condition::all(), query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let detail = with_details(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound("Order"))?;
    Ok(ApiResponse::success("Order found", detail, Some(Meta::empty())))
}

/// Cancelling does not return stock to inventory.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let from = existing.status;
    if !from.can_transition_to(payload.status) {
        return Err(AppError::BadRequest(format!(
            "Cannot move order from {} to {}",
            from.as_str(),
            payload.status.as_str()
        )));
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = from.as_str(), to = order.status.as_str(), "order status changed");
    record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": from, "to": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<LowStockList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold < 0 {
        return Err(AppError::BadRequest("threshold must not be negative".into()));
    }
    let (page, limit, offset) = normalize_page(query.page, query.per_page, DEFAULT_PER_PAGE);

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_asc(ProdCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Low stock",
        LowStockList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be zero".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let new_stock = adjusted_stock(product.stock, payload.delta)?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": product.id, "delta": payload.delta, "stock": new_stock }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

fn adjusted_stock(current: i32, delta: i32) -> AppResult<i32> {
    match current.checked_add(delta) {
        Some(stock) if stock >= 0 => Ok(stock),
        Some(_) => Err(AppError::BadRequest("stock cannot go below zero".into())),
        None => Err(AppError::BadRequest("stock adjustment overflows".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::adjusted_stock;

    #[test]
    fn stock_adjustments_stay_non_negative() {
        assert_eq!(adjusted_stock(10, -4).unwrap(), 6);
        assert_eq!(adjusted_stock(3, 7).unwrap(), 10);
        assert_eq!(adjusted_stock(3, -3).unwrap(), 0);
        assert!(adjusted_stock(3, -4).is_err());
        assert!(adjusted_stock(i32::MAX, 1).is_err());
    }
}
