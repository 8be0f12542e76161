use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{auth::repo::User, error::ApiError, products::repo::Product, state::AppState};

use super::dto::CreateOrderRequest;
use super::repo::Order;

pub fn router() -> Router<AppState> {
    Router::new().route("/orders", post(create_order).get(list_orders))
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    // Both references must exist before the insert runs.
    if !Product::exists(&state.db, payload.product_id).await? {
        warn!(product_id = payload.product_id, "order for unknown product");
        return Err(ApiError::ProductNotFound);
    }
    if !User::exists(&state.db, payload.buyer_id).await? {
        warn!(buyer_id = payload.buyer_id, "order for unknown buyer");
        return Err(ApiError::UserNotFound);
    }

    let order = Order::create(&state.db, payload.product_id, payload.buyer_id).await?;

    info!(
        order_id = order.id,
        product_id = order.product_id,
        buyer_id = order.buyer_id,
        "order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state))]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = Order::list(&state.db).await?;
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn order_serializes_all_fields() {
        let order = Order {
            id: 1,
            product_id: 7,
            buyer_id: 3,
            order_time: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"product_id\":7"));
        assert!(json.contains("\"buyer_id\":3"));
        assert!(json.contains("order_time"));
    }
}
