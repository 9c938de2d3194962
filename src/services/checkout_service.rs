use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit::record,
    dto::checkout::{CheckoutRequest, CheckoutResponse},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::ActiveModel as OrderItemActive,
        orders::ActiveModel as OrderActive,
        products::{Column as ProdCol, Entity as Products},
        sea_orm_active_enums::{AddressType, OrderStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pricing::{line_total, round_money},
    response::{ApiResponse, Meta},
    services::address_service::{insert_snapshot, unset_default},
    state::AppState,
};

/// Turn the caller's cart into an order. Everything between `begin` and
/// `commit` is one unit: on any error the transaction is dropped and rolled back.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let shipping_input = payload.shipping_address.normalized();
    shipping_input.validate()?;
    let billing_input = match payload.billing_address {
        Some(billing) => {
            let billing = billing.normalized();
            billing.validate()?;
            Some(billing)
        }
        None => None,
    };

    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    // lock in id order so concurrent checkouts touching the same products queue up
    let product_ids: Vec<Uuid> = cart.iter().map(|item| item.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut lines = Vec::with_capacity(cart.len());
    for item in &cart {
        let product = products
            .get(&item.product_id)
            .ok_or(AppError::NotFound("Product"))?;
        lines.push((item, product));
    }

    let totals = state
        .config
        .pricing
        .quote(lines.iter().map(|(item, product)| (product.price, item.quantity)))
        .rounded();

    if payload.save_addresses {
        unset_default(&txn, user.user_id, AddressType::Shipping).await?;
    }
    let shipping = insert_snapshot(
        &txn,
        user.user_id,
        AddressType::Shipping,
        &shipping_input,
        payload.save_addresses,
    )
    .await?;

    let billing_id = match billing_input {
        Some(billing) if billing != shipping_input => {
            if payload.save_addresses {
                unset_default(&txn, user.user_id, AddressType::Billing).await?;
            }
            insert_snapshot(
                &txn,
                user.user_id,
                AddressType::Billing,
                &billing,
                payload.save_addresses,
            )
            .await?
            .id
        }
        _ => shipping.id,
    };

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let order_number = build_order_number(order_id, now);

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        order_number: Set(order_number),
        status: Set(OrderStatus::Pending),
        subtotal: Set(totals.subtotal),
        tax: Set(totals.tax),
        shipping: Set(totals.shipping),
        total: Set(totals.total),
        shipping_address_id: Set(shipping.id),
        billing_address_id: Set(billing_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (item, product) in &lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(item.quantity),
            price: Set(product.price),
            total: Set(round_money(line_total(product.price, item.quantity))),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let remaining = product.stock.saturating_sub(item.quantity).max(0);
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::value(remaining))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total,
        "order placed"
    );
    record(
        &state.pool,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        CheckoutResponse {
            success: true,
            order_id: order.id,
            order_number: order.order_number,
        },
        Some(Meta::empty()),
    ))
}

/// `ORD-<yyyymmddHHMMSS>-<first 8 hex of the order id>`.
pub fn build_order_number(order_id: Uuid, at: DateTime<Utc>) -> String {
    let hex = order_id.simple().to_string();
    format!("ORD-{}-{}", at.format("%Y%m%d%H%M%S"), &hex[..8])
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::build_order_number;

    #[test]
    fn order_number_has_timestamp_and_id_prefix() {
        let id = Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(build_order_number(id, at), "ORD-20250309140507-3f2a9c1e");
    }

    #[test]
    fn order_numbers_differ_within_the_same_second() {
        let at = Utc::now();
        let a = build_order_number(Uuid::new_v4(), at);
        let b = build_order_number(Uuid::new_v4(), at);
        assert_eq!(a.len(), "ORD-20250309140507-3f2a9c1e".len());
        assert_ne!(a, b);
    }
}
