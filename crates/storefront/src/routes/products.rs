//! Product catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use libaas_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// Sort orders the catalog supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
}

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<SortOrder>,
}

/// Listing response.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// Price-range filter and sort, applied in memory after the (cached) fetch.
fn apply_filters(mut products: Vec<Product>, query: &ProductsQuery) -> Vec<Product> {
    products.retain(|product| {
        query.min_price.is_none_or(|min| product.price >= min)
            && query.max_price.is_none_or(|max| product.price <= max)
    });

    match query.sort {
        Some(SortOrder::PriceAsc) => products.sort_by(|a, b| a.price.cmp(&b.price)),
        Some(SortOrder::PriceDesc) => products.sort_by(|a, b| b.price.cmp(&a.price)),
        None => {}
    }

    products
}

/// List products, optionally filtered by category, price range, and sort.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<ProductsResponse>> {
    let products = state
        .sanity()
        .list_products(query.category.as_deref())
        .await?;

    Ok(Json(ProductsResponse {
        products: apply_filters((*products).clone(), &query),
    }))
}

/// Show a single product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = state
        .sanity()
        .product_by_id(&ProductId::new(&*id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))?;

    Ok(Json(product))
}
