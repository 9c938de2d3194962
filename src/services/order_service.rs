use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderItemDetail, OrderList, OrderWithItems},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let scope = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_matching(state, scope, query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let detail = with_details(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound("Order"))?;
    Ok(ApiResponse::ok(detail))
}

/// Paginated order listing shared by the customer and admin views; `scope`
/// narrows which orders are visible.
pub(crate) async fn list_matching(
    state: &AppState,
    scope: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = scope;
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = with_details(&state.orm, orders).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", OrderList { items }, Some(meta)))
}

/// Attach line items (with product name and slug) and both address snapshots,
/// preserving the order of `orders`.
pub(crate) async fn with_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .find_also_related(Products)
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?;
    for (item, product) in rows {
        let (product_name, product_slug) = product
            .map(|p| (p.name, p.slug))
            .unwrap_or_default();
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemDetail {
                item: OrderItem::from(item),
                product_name,
                product_slug,
            });
    }

    let address_ids: Vec<Uuid> = orders
        .iter()
        .flat_map(|o| [o.shipping_address_id, o.billing_address_id])
        .collect();
    let addresses: HashMap<Uuid, Address> = Addresses::find()
        .filter(AddressCol::Id.is_in(address_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, Address::from(a)))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            shipping_address: addresses.get(&order.shipping_address_id).cloned(),
            billing_address: addresses.get(&order.billing_address_id).cloned(),
            order: Order::from(order),
        })
        .collect())
}
