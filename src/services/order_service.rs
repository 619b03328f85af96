use std::collections::HashSet;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Alias, Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        cart_items::{self, Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders,
            Model as OrderModel,
        },
        products::Column as ProdCol,
        users,
        variants::{Column as VariantCol, Entity as Variants},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_vendor},
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::settings_service,
    state::AppState,
};

/// One selected cart line joined with its product and variant, read under
/// a row lock so the stock check and the decrement cannot be split by a
/// concurrent checkout.
#[derive(Debug, FromQueryResult)]
struct CartLine {
    cart_item_id: Uuid,
    product_id: Uuid,
    variant_id: Uuid,
    quantity: i32,
    vendor_id: Uuid,
    product_name: String,
    selling_price: i64,
    stock: i32,
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.cart_item_ids.is_empty() {
        return Err(AppError::BadRequest("No cart items selected".into()));
    }

    let txn = state.orm.begin().await?;

    let lines = CartItems::find()
        .select_only()
        .column_as(CartCol::Id, "cart_item_id")
        .column_as(CartCol::ProductId, "product_id")
        .column_as(CartCol::VariantId, "variant_id")
        .column_as(CartCol::Quantity, "quantity")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .join(JoinType::InnerJoin, cart_items::Relation::Variants.def())
        .column_as(ProdCol::VendorId, "vendor_id")
        .column_as(ProdCol::Name, "product_name")
        .column_as(VariantCol::SellingPrice, "selling_price")
        .column_as(VariantCol::Stock, "stock")
        .filter(CartCol::Id.is_in(payload.cart_item_ids.clone()))
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .into_model::<CartLine>()
        .all(&txn)
        .await?;

    // Ids that don't exist, belong to someone else, or were consumed by a
    // concurrent checkout all surface here as a size mismatch.
    if lines.len() != payload.cart_item_ids.len() {
        return Err(AppError::Forbidden);
    }

    let vendor_ids: HashSet<Uuid> = lines.iter().map(|l| l.vendor_id).collect();
    if vendor_ids.len() != 1 {
        return Err(AppError::BadRequest(
            "Items must belong to one vendor".into(),
        ));
    }
    let vendor_id = lines[0].vendor_id;

    let mut sub_total: i64 = 0;
    for line in &lines {
        if line.stock < line.quantity {
            return Err(AppError::BadRequest(format!(
                "Out of stock: {}",
                line.product_name
            )));
        }
        sub_total += line.selling_price * i64::from(line.quantity);
    }

    let fee_bps = settings_service::platform_fee_bps(&txn).await?;
    let platform_fee = sub_total * i64::from(fee_bps) / 10_000;
    let grand_total = sub_total + platform_fee;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        vendor_id: Set(vendor_id),
        shipping_address_id: Set(payload.shipping_address_id),
        sub_total: Set(sub_total),
        platform_fee: Set(platform_fee),
        grand_total: Set(grand_total),
        status: Set(OrderStatus::Pending.as_str().into()),
        payment_status: Set("PENDING".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let total_price = line.selling_price * i64::from(line.quantity);
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            variant_id: Set(line.variant_id),
            quantity: Set(line.quantity),
            price: Set(line.selling_price),
            total_price: Set(total_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));

        // Locked above, checked above; the decrement cannot go negative.
        Variants::update_many()
            .col_expr(
                VariantCol::Stock,
                Expr::col(VariantCol::Stock).sub(line.quantity),
            )
            .filter(VariantCol::Id.eq(line.variant_id))
            .exec(&txn)
            .await?;
    }

    // Remove only the consumed rows; unselected cart items survive.
    CartItems::delete_many()
        .filter(CartCol::Id.is_in(payload.cart_item_ids.clone()))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "grand_total": grand_total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders found", OrderList { items }, Some(meta)))
}

pub async fn list_vendor_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_vendor(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(OrderCol::VendorId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find();
    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        finder = finder.join(JoinType::InnerJoin, orders::Relation::Users.def());
        condition = condition.add(
            Condition::any()
                .add(
                    Expr::col((Orders, OrderCol::Id))
                        .cast_as(Alias::new("text"))
                        .ilike(pattern.clone()),
                )
                .add(Expr::col((users::Entity, users::Column::FullName)).ilike(pattern)),
        );
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = finder.filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders found", OrderList { items }, Some(meta)))
}

/// Vendor-scoped fetch. Cross-tenant ids come back as a plain NotFound so
/// order existence never leaks to another vendor.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_vendor(user)?;
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::VendorId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_vendor(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id).lock(LockType::Update).one(&txn).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.vendor_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let current = OrderStatus::parse(&order.status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown order status in store")))?;
    if !current.can_transition_to(payload.status) {
        return Err(AppError::BadRequest(format!(
            "Cannot move order from {} to {}",
            current.as_str(),
            payload.status.as_str()
        )));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order status updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        vendor_id: model.vendor_id,
        shipping_address_id: model.shipping_address_id,
        sub_total: model.sub_total,
        platform_fee: model.platform_fee,
        grand_total: model.grand_total,
        status: model.status,
        payment_status: model.payment_status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        variant_id: model.variant_id,
        quantity: model.quantity,
        price: model.price,
        total_price: model.total_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
