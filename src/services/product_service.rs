use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        CreateProductRequest, ProductList, ProductWithVariants, VariantList,
    },
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
        variants::{
            self, ActiveModel as VariantActive, Column as VariantCol, Entity as Variants,
            Model as VariantModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_vendor},
    models::{Product, Variant},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, ProductQuery, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(ProdCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(ProdCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let products: Vec<ProductModel> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut variants_by_product: HashMap<Uuid, Vec<Variant>> = HashMap::new();
    if !product_ids.is_empty() {
        for variant in Variants::find()
            .filter(VariantCol::ProductId.is_in(product_ids))
            .all(&state.orm)
            .await?
        {
            variants_by_product
                .entry(variant.product_id)
                .or_default()
                .push(variant_from_entity(variant));
        }
    }

    let items = products
        .into_iter()
        .map(|p| {
            let variants = variants_by_product.remove(&p.id).unwrap_or_default();
            ProductWithVariants {
                product: product_from_entity(p),
                variants,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let variants = Variants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(variant_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductWithVariants {
            product: product_from_entity(product),
            variants,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    ensure_vendor(user)?;
    if payload.variants.is_empty() {
        return Err(AppError::BadRequest(
            "A product needs at least one variant".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(user.user_id),
        name: Set(payload.name),
        description: Set(payload.description),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut variants = Vec::with_capacity(payload.variants.len());
    for v in payload.variants {
        if v.stock < 0 {
            return Err(AppError::BadRequest("stock cannot be negative".into()));
        }
        let variant = VariantActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            attributes: Set(v.attributes.unwrap_or_else(|| serde_json::json!({}))),
            original_price: Set(v.original_price),
            selling_price: Set(v.selling_price),
            stock: Set(v.stock),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        variants.push(variant_from_entity(variant));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        ProductWithVariants {
            product: product_from_entity(product),
            variants,
        },
        Some(Meta::empty()),
    ))
}

/// Vendor-side stock correction. Checkout is the only other writer of
/// `variants.stock`; the same lock-check-write shape applies here.
pub async fn adjust_stock(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    delta: i32,
) -> AppResult<ApiResponse<Variant>> {
    ensure_vendor(user)?;
    if delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;

    let variant = Variants::find_by_id(variant_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let variant = match variant {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };

    let product = Products::find_by_id(variant.product_id).one(&txn).await?;
    match product {
        Some(p) if p.vendor_id == user.user_id => {}
        _ => return Err(AppError::Forbidden),
    }

    let new_stock = variant.stock + delta;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let mut active: VariantActive = variant.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "stock_adjust",
        Some("variants"),
        Some(serde_json::json!({ "variant_id": updated.id, "delta": delta })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Stock updated",
        variant_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<VariantList>> {
    ensure_vendor(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let mut finder = Variants::find()
        .join(JoinType::InnerJoin, variants::Relation::Products.def())
        .filter(ProdCol::VendorId.eq(user.user_id))
        .filter(VariantCol::Stock.lte(threshold));
    finder = finder
        .order_by_asc(VariantCol::Stock)
        .order_by_desc(VariantCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(variant_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", VariantList { items }, Some(meta)))
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        vendor_id: model.vendor_id,
        name: model.name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn variant_from_entity(model: VariantModel) -> Variant {
    Variant {
        id: model.id,
        product_id: model.product_id,
        attributes: model.attributes,
        original_price: model.original_price,
        selling_price: model.selling_price,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
