use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, Variant};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub attributes: Option<serde_json::Value>,
    pub original_price: i64,
    pub selling_price: i64,
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub variants: Vec<CreateVariantRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithVariants {
    pub product: Product,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductWithVariants>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantList {
    pub items: Vec<Variant>,
}
