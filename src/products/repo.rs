use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub seller_id: Option<i64>,
}

impl Product {
    pub async fn create(
        db: &PgPool,
        name: &str,
        price: Decimal,
        description: Option<&str>,
        seller_id: Option<i64>,
    ) -> sqlx::Result<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, description, seller_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, description, seller_id
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(description)
        .bind(seller_id)
        .fetch_one(db)
        .await
    }

    /// All products in creation order.
    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, description, seller_id
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await
    }
}
