use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::notifications::{Notification, NotificationList},
    entity::{
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        sea_orm_active_enums::OrderStatus,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    state::AppState,
};

const NOTIFICATION_LIMIT: u64 = 5;

/// Recent orders that are still moving through fulfilment.
pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<NotificationList>> {
    let items = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Status.is_in([
                    OrderStatus::Pending,
                    OrderStatus::Processing,
                    OrderStatus::Shipped,
                ])),
        )
        .order_by_desc(OrderCol::CreatedAt)
        .limit(NOTIFICATION_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(notification_for)
        .collect();

    Ok(ApiResponse::ok(NotificationList { items }))
}

fn notification_for(order: OrderModel) -> Notification {
    let (kind, message) = match order.status {
        OrderStatus::Shipped => ("success", format!("Order {} has shipped", order.order_number)),
        OrderStatus::Processing => (
            "info",
            format!("Order {} is being prepared", order.order_number),
        ),
        _ => ("info", format!("Order {} was received", order.order_number)),
    };
    Notification {
        id: order.id,
        kind: kind.to_string(),
        message,
        order_number: order.order_number,
        status: order.status,
        created_at: order.created_at.with_timezone(&chrono::Utc),
        read: false,
    }
}
