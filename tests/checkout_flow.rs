//! End-to-end service flows against a real Postgres. Skipped unless
//! `TEST_DATABASE_URL` or `DATABASE_URL` is set.

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        addresses::AddressInput,
        cart::{AddToCartRequest, UpdateCartItemRequest},
        checkout::CheckoutRequest,
        orders::UpdateOrderStatusRequest,
        reviews::CreateReviewRequest,
        wishlist::WishlistRequest,
    },
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Entity as Products, Model as ProductModel},
        sea_orm_active_enums::{AddressType, OrderStatus},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    routes::params::OrderListQuery,
    services::{
        admin_service, cart_service, checkout_service, order_service, review_service,
        wishlist_service,
    },
    state::AppState,
};
use uuid::Uuid;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run checkout flow tests.");
            return Ok(None);
        }
    };

    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some("integration-secret".to_string()),
        _ => None,
    })?;
    let pool = create_pool(&config.database_url, 5).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool, config)))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.test", Uuid::new_v4())),
        name: Set("Flow Tester".into()),
        phone: Set(None),
        password_hash: Set("not-used".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

async fn create_product(state: &AppState, price: &str, stock: i32) -> anyhow::Result<ProductModel> {
    let slug = format!("flow-{}", Uuid::new_v4().simple());
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Flow Frame".into()),
        slug: Set(slug),
        description: Set(None),
        price: Set(d(price)),
        compare_price: Set(None),
        sku: Set(None),
        stock: Set(stock),
        images: Set(serde_json::json!([])),
        is_active: Set(true),
        is_featured: Set(false),
        category_id: Set(None),
        brand_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

fn address(city: &str) -> AddressInput {
    AddressInput {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        company: None,
        address1: "12 St James's Square".into(),
        address2: None,
        city: city.into(),
        state: "London".into(),
        postal_code: "SW1Y 4JH".into(),
        country: "GB".into(),
        phone: None,
    }
}

fn checkout(billing: Option<AddressInput>, save_addresses: bool) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: address("London"),
        billing_address: billing,
        save_addresses,
    }
}

async fn add(state: &AppState, user: &AuthUser, product: &ProductModel, qty: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(qty),
        },
    )
    .await?;
    Ok(())
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product vanished"))?;
    Ok(product.stock)
}

#[tokio::test]
async fn checkout_snapshots_totals_decrements_stock_and_clears_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "100.00", 10).await?;

    add(&state, &user, &product, 2).await?;
    let placed = checkout_service::place_order(&state, &user, checkout(None, false))
        .await?
        .data
        .unwrap();
    assert!(placed.success);
    assert!(placed.order_number.starts_with("ORD-"));

    let detail = order_service::get_order(&state, &user, placed.order_id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.subtotal, d("200.00"));
    assert_eq!(detail.order.tax, d("16.00"));
    assert_eq!(detail.order.shipping, d("0.00"));
    assert_eq!(detail.order.total, d("216.00"));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].item.price, d("100.00"));
    assert_eq!(detail.items[0].item.quantity, 2);
    // identical billing means one shared address row
    assert_eq!(detail.order.shipping_address_id, detail.order.billing_address_id);

    assert_eq!(stock_of(&state, product.id).await?, 8);
    let remaining = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(remaining, 0);
    Ok(())
}

#[tokio::test]
async fn empty_cart_checkout_persists_nothing() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;

    let err = checkout_service::place_order(&state, &user, checkout(None, true))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    let addresses = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!((orders, addresses), (0, 0));
    Ok(())
}

#[tokio::test]
async fn distinct_billing_address_gets_its_own_row() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "12.50", 5).await?;

    add(&state, &user, &product, 1).await?;
    let placed = checkout_service::place_order(&state, &user, checkout(Some(address("Paris")), false))
        .await?
        .data
        .unwrap();

    let detail = order_service::get_order(&state, &user, placed.order_id)
        .await?
        .data
        .unwrap();
    assert_ne!(detail.order.shipping_address_id, detail.order.billing_address_id);
    let billing = detail.billing_address.unwrap();
    assert_eq!(billing.address_type, AddressType::Billing);
    assert_eq!(billing.city, "Paris");
    // 12.50 is under the free shipping threshold
    assert_eq!(detail.order.shipping, d("5.99"));
    assert_eq!(detail.order.total, d("19.49"));
    Ok(())
}

#[tokio::test]
async fn stock_is_clamped_at_zero_when_it_fell_after_carting() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "20.00", 5).await?;
    add(&state, &user, &product, 3).await?;

    let mut active: ProductActive = product.clone().into();
    active.stock = Set(1);
    active.update(&state.orm).await?;

    checkout_service::place_order(&state, &user, checkout(None, false)).await?;
    assert_eq!(stock_of(&state, product.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn saving_addresses_keeps_a_single_default() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "60.00", 10).await?;

    for _ in 0..2 {
        add(&state, &user, &product, 1).await?;
        checkout_service::place_order(&state, &user, checkout(None, true)).await?;
    }

    let defaults = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .filter(AddressCol::AddressType.eq(AddressType::Shipping))
        .filter(AddressCol::IsDefault.eq(true))
        .count(&state.orm)
        .await?;
    assert_eq!(defaults, 1);
    Ok(())
}

#[tokio::test]
async fn billing_equal_to_shipping_reuses_one_row() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "15.00", 10).await?;

    let mut padded = address(" London ");
    padded.first_name = "  Ada".into();
    padded.company = Some("   ".into());

    for billing in [address("London"), padded] {
        add(&state, &user, &product, 1).await?;
        let placed = checkout_service::place_order(&state, &user, checkout(Some(billing), false))
            .await?
            .data
            .unwrap();
        let detail = order_service::get_order(&state, &user, placed.order_id)
            .await?
            .data
            .unwrap();
        assert_eq!(detail.order.shipping_address_id, detail.order.billing_address_id);
    }

    // one shared row per order, none of them typed BILLING
    let rows = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 2);
    let billing_rows = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .filter(AddressCol::AddressType.eq(AddressType::Billing))
        .count(&state.orm)
        .await?;
    assert_eq!(billing_rows, 0);
    Ok(())
}

#[tokio::test]
async fn saved_billing_addresses_keep_a_single_default() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "60.00", 10).await?;

    for _ in 0..2 {
        add(&state, &user, &product, 1).await?;
        checkout_service::place_order(&state, &user, checkout(Some(address("Paris")), true))
            .await?;
    }

    let billing_rows = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .filter(AddressCol::AddressType.eq(AddressType::Billing))
        .count(&state.orm)
        .await?;
    assert_eq!(billing_rows, 2);
    let billing_defaults = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .filter(AddressCol::AddressType.eq(AddressType::Billing))
        .filter(AddressCol::IsDefault.eq(true))
        .count(&state.orm)
        .await?;
    assert_eq!(billing_defaults, 1);
    Ok(())
}

#[tokio::test]
async fn cart_quantity_rules() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "10.00", 4).await?;

    let err = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(0),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    add(&state, &user, &product, 3).await?;
    let err = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(2),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 4, .. }));

    let item = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(item.quantity, 4);

    let err = cart_service::update_cart_item(&state, &user, item.id, UpdateCartItemRequest { quantity: 5 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));

    let stranger = create_user(&state, ROLE_USER).await?;
    let err = cart_service::remove_cart_item(&state, &stranger, item.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let cart = cart_service::list_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.subtotal, d("40.00"));
    Ok(())
}

#[tokio::test]
async fn concurrent_first_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "25.00", 10).await?;

    let request = || AddToCartRequest {
        product_id: product.id,
        quantity: Some(2),
    };
    let (first, second) = tokio::join!(
        cart_service::add_to_cart(&state, &user, request()),
        cart_service::add_to_cart(&state, &user, request()),
    );
    first?;
    second?;

    let cart = cart_service::list_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 4);
    Ok(())
}

#[tokio::test]
async fn reviews_are_unique_and_verified_only_after_delivery() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let browser = create_user(&state, ROLE_USER).await?;
    let buyer = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "89.50", 10).await?;

    let review = |rating| CreateReviewRequest {
        product_id: product.id,
        rating,
        title: "Sharp frames".into(),
        comment: Some("Fits well.".into()),
    };

    let first = review_service::create_review(&state, &browser, review(4))
        .await?
        .data
        .unwrap();
    assert!(!first.is_verified);
    let err = review_service::create_review(&state, &browser, review(5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    add(&state, &buyer, &product, 1).await?;
    let placed = checkout_service::place_order(&state, &buyer, checkout(None, false))
        .await?
        .data
        .unwrap();
    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        admin_service::update_order_status(
            &state,
            &admin,
            placed.order_id,
            UpdateOrderStatusRequest { status },
        )
        .await?;
    }

    // delisting after the sale does not block the buyer's review
    let mut retired: ProductActive = product.clone().into();
    retired.is_active = Set(false);
    retired.update(&state.orm).await?;

    let verified = review_service::create_review(&state, &buyer, review(5))
        .await?
        .data
        .unwrap();
    assert!(verified.is_verified);

    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            product_id: Uuid::new_v4(),
            ..review(5)
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));
    Ok(())
}

#[tokio::test]
async fn illegal_status_transition_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "30.00", 3).await?;
    add(&state, &user, &product, 1).await?;
    let placed = checkout_service::place_order(&state, &user, checkout(None, false))
        .await?
        .data
        .unwrap();

    let err = admin_service::update_order_status(
        &state,
        &admin,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    admin_service::update_order_status(
        &state,
        &admin,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?;
    // cancelling leaves stock where checkout put it
    assert_eq!(stock_of(&state, product.id).await?, 2);

    let history = order_service::list_orders(
        &state,
        &user,
        OrderListQuery {
            status: Some(OrderStatus::Cancelled),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(history.meta.unwrap().total, Some(1));
    Ok(())
}

#[tokio::test]
async fn wishlist_rejects_duplicates_and_removes_idempotently() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product = create_product(&state, "45.00", 8).await?;
    let request = || WishlistRequest {
        product_id: product.id,
    };

    wishlist_service::add_to_wishlist(&state, &user, request()).await?;
    let err = wishlist_service::add_to_wishlist(&state, &user, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let check = wishlist_service::check_wishlist(&state, &user, product.id)
        .await?
        .data
        .unwrap();
    assert!(check.in_wishlist);

    let first = wishlist_service::remove_from_wishlist(&state, &user, request())
        .await?
        .data
        .unwrap();
    let second = wishlist_service::remove_from_wishlist(&state, &user, request())
        .await?
        .data
        .unwrap();
    assert!(first.removed);
    assert!(!second.removed);
    Ok(())
}
