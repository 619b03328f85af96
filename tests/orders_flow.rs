mod common;

use pet_marketplace_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, UpdateOrderStatusRequest},
    },
    entity::{
        products::ActiveModel as ProductActive,
        shipping_addresses::ActiveModel as AddressActive,
        variants::{ActiveModel as VariantActive, Entity as Variants},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::OrderStatus,
    routes::params::{OrderListQuery, Pagination},
    services::{cart_service, order_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Integration flow: buyer fills a cart, checks out selected items, vendor
// walks the order through its status transitions.
#[tokio::test]
async fn checkout_and_order_status_flow() -> anyhow::Result<()> {
    let database_url = match common::test_database_url() {
        Some(url) => url,
        None => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = common::setup_state(&database_url).await?;

    let buyer_id = common::create_user(&state, "user", "buyer@example.com").await?;
    let vendor_id = common::create_user(&state, "vendor", "vendor@example.com").await?;
    let other_vendor_id = common::create_user(&state, "vendor", "vendor2@example.com").await?;

    let buyer = AuthUser {
        user_id: buyer_id,
        role: "user".into(),
    };
    let vendor = AuthUser {
        user_id: vendor_id,
        role: "vendor".into(),
    };

    let address_id = create_address(&state, buyer_id).await?;

    // Vendor catalog: one product with two variants, plus a third variant
    // that stays in the cart unselected.
    let (_, rope_small) = create_product_with_variant(&state, vendor_id, "Chew Rope", 1000, 5).await?;
    let (_, rope_large) = create_product_with_variant(&state, vendor_id, "Chew Rope XL", 2500, 10).await?;
    let (_, treats) = create_product_with_variant(&state, vendor_id, "Salmon Treats", 600, 50).await?;
    let (_, rival_item) =
        create_product_with_variant(&state, other_vendor_id, "Rival Kibble", 800, 30).await?;

    let cart_small = add_to_cart(&state, &buyer, rope_small, 2).await?;
    let cart_large = add_to_cart(&state, &buyer, rope_large, 1).await?;
    let _cart_treats = add_to_cart(&state, &buyer, treats, 3).await?;
    let cart_rival = add_to_cart(&state, &buyer, rival_item, 1).await?;

    // Mixed-vendor selection is rejected before anything is written.
    let err = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            cart_item_ids: vec![cart_small, cart_rival],
            shipping_address_id: address_id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Checkout two of the four cart lines.
    let resp = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            cart_item_ids: vec![cart_small, cart_large],
            shipping_address_id: address_id,
        },
    )
    .await?;
    let created = resp.data.unwrap();
    let order = created.order;

    let sub_total = 2 * 1000 + 2500;
    let platform_fee = sub_total * 200 / 10_000;
    assert_eq!(order.sub_total, sub_total);
    assert_eq!(order.platform_fee, platform_fee);
    assert_eq!(order.grand_total, sub_total + platform_fee);
    assert_eq!(order.status, OrderStatus::Pending.as_str());
    assert_eq!(created.items.len(), 2);

    // Stock was decremented under the same transaction.
    let small = Variants::find_by_id(rope_small).one(&state.orm).await?.unwrap();
    assert_eq!(small.stock, 3);
    let large = Variants::find_by_id(rope_large).one(&state.orm).await?.unwrap();
    assert_eq!(large.stock, 9);

    // Unselected cart lines survive the checkout.
    let cart = cart_service::list_cart(
        &state.pool,
        &buyer,
        Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?;
    let remaining = cart.data.unwrap().items;
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|i| i.id != cart_small && i.id != cart_large));

    // Selecting more than the available stock fails the whole checkout.
    let greedy = add_to_cart(&state, &buyer, rope_small, 4).await?;
    let err = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            cart_item_ids: vec![greedy],
            shipping_address_id: address_id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg.starts_with("Out of stock")));
    let small = Variants::find_by_id(rope_small).one(&state.orm).await?.unwrap();
    assert_eq!(small.stock, 3, "failed checkout must not touch stock");

    // Vendor sees the order; the buyer cannot use vendor endpoints.
    let listed = order_service::list_vendor_orders(&state, &vendor, OrderListQuery {
        pagination: Pagination {
            page: Some(1),
            per_page: Some(20),
        },
        status: None,
        search: None,
        sort_order: None,
    })
    .await?;
    assert_eq!(listed.data.unwrap().items.len(), 1);
    assert!(matches!(
        order_service::get_order(&state, &buyer, order.id).await.unwrap_err(),
        AppError::Forbidden
    ));

    // Legal transition chain, then attempts to leave the rails.
    let updated = order_service::update_order_status(
        &state,
        &vendor,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Confirmed,
        },
    )
    .await?;
    assert_eq!(updated.data.unwrap().status, OrderStatus::Confirmed.as_str());

    let err = order_service::update_order_status(
        &state,
        &vendor,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Pending,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    order_service::update_order_status(
        &state,
        &vendor,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?;
    order_service::update_order_status(
        &state,
        &vendor,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await?;

    // Delivered is terminal.
    let err = order_service::update_order_status(
        &state,
        &vendor,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

async fn create_address(state: &AppState, user_id: Uuid) -> anyhow::Result<Uuid> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        label: Set("Home".into()),
        address_line: Set("12 Harbor Lane".into()),
        city: Set("Portsmouth".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

async fn create_product_with_variant(
    state: &AppState,
    vendor_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<(Uuid, Uuid)> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        name: Set(name.into()),
        description: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        attributes: Set(serde_json::json!({})),
        original_price: Set(price),
        selling_price: Set(price),
        stock: Set(stock),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok((product.id, variant.id))
}

async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let resp = cart_service::add_to_cart(
        &state.pool,
        user,
        AddToCartRequest {
            variant_id,
            quantity,
        },
    )
    .await?;
    Ok(resp.data.unwrap().id)
}
