use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartItemDto, CartList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product, Variant},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

#[derive(FromRow)]
struct CartJoinedRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    vendor_id: Uuid,
    name: String,
    description: Option<String>,
    product_created_at: DateTime<Utc>,
    variant_id: Uuid,
    attributes: serde_json::Value,
    original_price: i64,
    selling_price: i64,
    stock: i32,
    variant_created_at: DateTime<Utc>,
}

pub async fn list_cart(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, CartJoinedRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.vendor_id, p.name, p.description,
               p.created_at AS product_created_at,
               v.id AS variant_id, v.attributes, v.original_price, v.selling_price,
               v.stock, v.created_at AS variant_created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        JOIN variants v ON v.id = ci.variant_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.cart_id,
            total_price: row.selling_price * i64::from(row.quantity),
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                vendor_id: row.vendor_id,
                name: row.name,
                description: row.description,
                created_at: row.product_created_at,
            },
            variant: Variant {
                id: row.variant_id,
                product_id: row.product_id,
                attributes: row.attributes,
                original_price: row.original_price,
                selling_price: row.selling_price,
                stock: row.stock,
                created_at: row.variant_created_at,
            },
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let variant: Option<(Uuid, Uuid)> =
        sqlx::query_as("SELECT id, product_id FROM variants WHERE id = $1")
            .bind(payload.variant_id)
            .fetch_optional(pool)
            .await?;
    let (variant_id, product_id) = match variant {
        Some(v) => v,
        None => return Err(AppError::BadRequest("variant not found".to_string())),
    };

    // Re-adding the same variant replaces the quantity instead of stacking
    // a second row; (user_id, variant_id) is unique.
    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (user_id, product_id, variant_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, variant_id)
        DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(variant_id)
    .bind(payload.quantity)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "variant_id": variant_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    cart_item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(cart_item_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": cart_item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
