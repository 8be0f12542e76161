use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub account: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Find a user by account handle.
    pub async fn find_by_account(db: &PgPool, account: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, account, email, password_hash, created_at
            FROM users
            WHERE account = $1
            "#,
        )
        .bind(account)
        .fetch_optional(db)
        .await
    }

    /// Find a user by login identifier, matching account or email.
    pub async fn find_by_login(db: &PgPool, login: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, account, email, password_hash, created_at
            FROM users
            WHERE account = $1 OR email = $1
            "#,
        )
        .bind(login)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, account, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, account, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await
    }

    /// Create a new user with a hashed password.
    pub async fn create(
        db: &PgPool,
        account: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (account, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, account, email, password_hash, created_at
            "#,
        )
        .bind(account)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn update_password(db: &PgPool, id: i64, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query(r#"UPDATE users SET password_hash = $1 WHERE id = $2"#)
            .bind(password_hash)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_user_omits_password_hash() {
        let user = User {
            id: 1,
            account: "bob".into(),
            email: "bob@x.com".into(),
            password_hash: "$argon2id$v=19$hash".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("bob@x.com"));
        assert!(!json.contains("password_hash"));
    }
}
