//! 购物车处理器

use axum::{
    extract::{Path, State},
    response::Json,
};

use super::{
    model::{AddItemRequest, CartId, CartView, ItemChange, RemoveItemRequest},
    pricing::price_cart,
};
use crate::app::AppState;
use crate::core::{error::AppError, response::MessageResponse};

/// POST /shopping-cart
pub async fn add_item(
    State(state): State<AppState>,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if state.settings.validate_products_on_add
        && state.catalog.get_product(&payload.product_id).await?.is_none()
    {
        return Err(AppError::ProductNotFound);
    }

    let requested = payload
        .cart_id
        .filter(|id| !id.is_empty())
        .map(CartId::from);

    let outcome = state
        .carts
        .add_item(requested.as_ref(), &payload.product_id, payload.quantity)?;

    let message = if outcome.created {
        "New cart created and product added successfully"
    } else {
        "Product added to cart successfully"
    };
    Ok(Json(MessageResponse::with_cart(message, outcome.cart_id)))
}

/// DELETE /shopping-cart
pub async fn remove_item(
    State(state): State<AppState>,
    Json(payload): Json<RemoveItemRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let cart_id = CartId::from(payload.cart_id);
    let change =
        state
            .carts
            .decrement_or_remove_item(&cart_id, &payload.product_id, payload.quantity)?;

    let message = match change {
        ItemChange::Removed => "Product removed from cart successfully",
        ItemChange::Decreased { .. } => "Product quantity updated successfully",
    };
    Ok(Json(MessageResponse::new(message)))
}

/// DELETE /shopping-cart/:cartId
pub async fn delete_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.carts.delete_cart(&CartId::from(cart_id))?;
    Ok(Json(MessageResponse::new("Cart deleted successfully")))
}

/// GET /shopping-cart/:cartId
pub async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>, AppError> {
    let cart = state.carts.get_cart(&CartId::from(cart_id))?;
    let products = state.catalog.list_products(None).await?;
    Ok(Json(price_cart(&cart, &products)))
}
