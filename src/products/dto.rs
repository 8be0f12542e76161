use rust_decimal::Decimal;
use serde::Deserialize;

/// Request body for product creation. The created row is returned as-is.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub seller_id: Option<i64>,
}
