use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressInput, AddressList, AddressRequest},
        admin::{DashboardStats, InventoryAdjustRequest, LowStockList, StatusCount},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
        checkout::{CheckoutRequest, CheckoutResponse},
        contact::ContactRequest,
        notifications::{Notification, NotificationList},
        orders::{OrderItemDetail, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{
            BrandList, CategoryList, CreateProductRequest, ProductDetail, ProductList,
            RatingSummary, ReviewView, UpdateProductRequest,
        },
        profile::UpdateProfileRequest,
        reviews::CreateReviewRequest,
        wishlist::{WishlistCheck, WishlistEntry, WishlistList, WishlistRemoval, WishlistRequest},
    },
    entity::sea_orm_active_enums::{AddressType, OrderStatus},
    models::{
        Address, Brand, CartItem, Category, Order, OrderItem, Product, ProductSummary, Review,
        User, WishlistItem,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, cart, catalog, checkout, contact, health, notifications, orders,
        params, products, profile, reviews, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        catalog::list_categories,
        catalog::list_brands,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        checkout::create_session,
        orders::list_orders,
        orders::get_order,
        reviews::create_review,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::check_wishlist,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        profile::get_profile,
        profile::update_profile,
        notifications::list_notifications,
        contact::submit_contact,
        admin::dashboard,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Product,
            ProductSummary,
            Category,
            Brand,
            CartItem,
            Address,
            Order,
            OrderItem,
            Review,
            WishlistItem,
            OrderStatus,
            AddressType,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemDto,
            CartList,
            AddressInput,
            AddressRequest,
            AddressList,
            CheckoutRequest,
            CheckoutResponse,
            OrderItemDetail,
            OrderWithItems,
            OrderList,
            UpdateOrderStatusRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductDetail,
            RatingSummary,
            ReviewView,
            CategoryList,
            BrandList,
            CreateReviewRequest,
            WishlistRequest,
            WishlistEntry,
            WishlistList,
            WishlistRemoval,
            WishlistCheck,
            UpdateProfileRequest,
            Notification,
            NotificationList,
            ContactRequest,
            DashboardStats,
            StatusCount,
            InventoryAdjustRequest,
            LowStockList,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CheckoutResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Catalog browsing and product management"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Checkout", description = "Order placement"),
        (name = "Orders", description = "Order history and notifications"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Addresses", description = "Address book"),
        (name = "Profile", description = "Account details"),
        (name = "Contact", description = "Contact form"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn openapi_lists_checkout_and_admin_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/checkout/session"));
        assert!(doc.paths.paths.contains_key("/api/admin/orders/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/wishlist/check/{product_id}"));
    }
}
