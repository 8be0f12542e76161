use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::{error::ApiError, state::AppState};

use super::dto::CreateProductRequest;
use super::repo::Product;

pub fn router() -> Router<AppState> {
    Router::new().route("/products", post(create_product).get(list_products))
}

fn validate_new_product(payload: &CreateProductRequest) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if payload.price < Decimal::ZERO {
        return Err(ApiError::Validation("Price must be non-negative".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_new_product(&payload)?;

    let product = Product::create(
        &state.db,
        payload.name.trim(),
        payload.price,
        payload.description.as_deref(),
        payload.seller_id,
    )
    .await?;

    info!(product_id = product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = Product::list(&state.db).await?;
    Ok(Json(products))
}
