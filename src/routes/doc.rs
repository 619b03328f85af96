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
        admissions::{AdmissionList, AdmissionRequestDto, EnrollCourseRequest, RespondAdmissionRequest},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemDto, CartList},
        community::{BookmarkDto, BookmarkPage, BookmarkedPost, BookmarkedReel, ToggleResult},
        orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{
            AdjustStockRequest, CreateProductRequest, CreateVariantRequest, ProductList,
            ProductWithVariants, VariantList,
        },
        settings::{SettingsHistoryEntry, SettingsHistoryPage, UpdateSettingsRequest},
    },
    models::{
        CartItem, Engagement, Enrollment, Order, OrderItem, PlatformSettings, Product, User,
        Variant,
    },
    response::{ApiResponse, Meta},
    routes::{
        admissions, auth, cart, community, health, orders, params, products as product_routes,
        settings,
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
        auth::login,
        auth::register,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::adjust_stock,
        product_routes::list_low_stock,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::create_order,
        orders::list_user_orders,
        orders::list_vendor_orders,
        orders::get_order,
        orders::update_order_status,
        admissions::enroll_to_course,
        admissions::list_enroll_requests,
        admissions::get_admission_details,
        admissions::respond_to_admission,
        settings::get_settings,
        settings::update_settings,
        settings::get_settings_history,
        community::toggle_post_bookmark,
        community::toggle_post_like,
        community::toggle_reel_bookmark,
        community::toggle_reel_like,
        community::list_my_bookmarks,
        community::get_bookmark
    ),
    components(
        schemas(
            User,
            Product,
            Variant,
            CartItem,
            Order,
            OrderItem,
            Enrollment,
            PlatformSettings,
            Engagement,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            CreateVariantRequest,
            AdjustStockRequest,
            ProductWithVariants,
            ProductList,
            VariantList,
            AddToCartRequest,
            CartItemDto,
            CartList,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            EnrollCourseRequest,
            RespondAdmissionRequest,
            AdmissionRequestDto,
            AdmissionList,
            UpdateSettingsRequest,
            SettingsHistoryEntry,
            SettingsHistoryPage,
            ToggleResult,
            BookmarkedPost,
            BookmarkedReel,
            BookmarkDto,
            BookmarkPage,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::CursorQuery,
            params::BookmarkListQuery,
            Meta,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<AdmissionList>,
            ApiResponse<PlatformSettings>,
            ApiResponse<SettingsHistoryPage>,
            ApiResponse<BookmarkPage>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admissions", description = "Course admission endpoints"),
        (name = "Settings", description = "Platform settings endpoints"),
        (name = "Community", description = "Bookmark and like endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
