//! 商品目录处理器

use axum::{
    extract::{Query, State},
    response::Json,
};

use super::model::{Category, Product, ProductQuery};
use crate::app::AppState;
use crate::core::error::AppError;

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.catalog.list_categories().await?))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .catalog
        .list_products(query.category.as_deref())
        .await?;
    Ok(Json(products))
}
