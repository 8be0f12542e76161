use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub order_time: OffsetDateTime,
}

impl Order {
    /// Insert with a server-assigned order_time.
    pub async fn create(db: &PgPool, product_id: i64, buyer_id: i64) -> sqlx::Result<Order> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (product_id, buyer_id)
            VALUES ($1, $2)
            RETURNING id, product_id, buyer_id, order_time
            "#,
        )
        .bind(product_id)
        .bind(buyer_id)
        .fetch_one(db)
        .await
    }

    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, buyer_id, order_time
            FROM orders
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
    }
}
