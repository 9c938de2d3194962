use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit::record,
    dto::addresses::{AddressInput, AddressList, AddressRequest},
    entity::{
        addresses::{
            ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses,
            Model as AddressModel,
        },
        orders::{Column as OrderCol, Entity as Orders},
        sea_orm_active_enums::AddressType,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::UserId.eq(user.user_id))
                .add(AddressCol::IsArchived.eq(false)),
        )
        .order_by_desc(AddressCol::IsDefault)
        .order_by_desc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::ok(AddressList { items }))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let input = payload.address.normalized();
    input.validate()?;

    let txn = state.orm.begin().await?;
    if payload.is_default {
        unset_default(&txn, user.user_id, payload.address_type).await?;
    }
    let address = insert_snapshot(
        &txn,
        user.user_id,
        payload.address_type,
        &input,
        payload.is_default,
    )
    .await?;
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "address_create",
        "addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address created",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

/// Rows already attached to an order are archived and replaced by a fresh copy,
/// so past orders keep pointing at what was actually shipped.
pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let input = payload.address.normalized();
    input.validate()?;

    let txn = state.orm.begin().await?;
    let existing = find_live(&txn, user.user_id, id).await?;

    if payload.is_default {
        unset_default(&txn, user.user_id, payload.address_type).await?;
    }

    let address = if is_referenced(&txn, existing.id).await? {
        let mut archived: AddressActive = existing.into();
        archived.is_archived = Set(true);
        archived.is_default = Set(false);
        archived.update(&txn).await?;
        insert_snapshot(
            &txn,
            user.user_id,
            payload.address_type,
            &input,
            payload.is_default,
        )
        .await?
    } else {
        let mut active: AddressActive = existing.into();
        active.address_type = Set(payload.address_type);
        active.first_name = Set(input.first_name);
        active.last_name = Set(input.last_name);
        active.company = Set(input.company);
        active.address1 = Set(input.address1);
        active.address2 = Set(input.address2);
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.postal_code = Set(input.postal_code);
        active.country = Set(input.country);
        active.phone = Set(input.phone);
        active.is_default = Set(payload.is_default);
        active.update(&txn).await?
    };
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "address_update",
        "addresses",
        serde_json::json!({ "address_id": id, "current_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address updated",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let existing = find_live(&txn, user.user_id, id).await?;

    if is_referenced(&txn, existing.id).await? {
        let mut archived: AddressActive = existing.into();
        archived.is_archived = Set(true);
        archived.is_default = Set(false);
        archived.update(&txn).await?;
    } else {
        Addresses::delete_by_id(existing.id).exec(&txn).await?;
    }
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "address_delete",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_live<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<AddressModel> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(id))
                .add(AddressCol::UserId.eq(user_id))
                .add(AddressCol::IsArchived.eq(false)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Address"))
}

async fn is_referenced<C: ConnectionTrait>(conn: &C, address_id: Uuid) -> AppResult<bool> {
    let count = Orders::find()
        .filter(
            Condition::any()
                .add(OrderCol::ShippingAddressId.eq(address_id))
                .add(OrderCol::BillingAddressId.eq(address_id)),
        )
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Clear the user's live default for `address_type`. Must run before a new
/// default is written in the same transaction.
pub(crate) async fn unset_default<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    address_type: AddressType,
) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(
            Condition::all()
                .add(AddressCol::UserId.eq(user_id))
                .add(AddressCol::AddressType.eq(address_type))
                .add(AddressCol::IsDefault.eq(true)),
        )
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn insert_snapshot<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    address_type: AddressType,
    input: &AddressInput,
    is_default: bool,
) -> AppResult<AddressModel> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        address_type: Set(address_type),
        first_name: Set(input.first_name.clone()),
        last_name: Set(input.last_name.clone()),
        company: Set(input.company.clone()),
        address1: Set(input.address1.clone()),
        address2: Set(input.address2.clone()),
        city: Set(input.city.clone()),
        state: Set(input.state.clone()),
        postal_code: Set(input.postal_code.clone()),
        country: Set(input.country.clone()),
        phone: Set(input.phone.clone()),
        is_default: Set(is_default),
        is_archived: Set(false),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(address)
}
