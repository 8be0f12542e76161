use serde::Deserialize;

/// Request body for order creation. order_time is assigned by the server.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: i64,
    pub buyer_id: i64,
}
