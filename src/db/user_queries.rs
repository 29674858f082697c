use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::user::User;

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        push_token: row.try_get("push_token")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new user account
pub async fn create_user(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO app_users (full_name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, full_name, email, password_hash, push_token, created_at
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    user_from_row(&row)
}

/// Look up a user by email (the identity key)
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, full_name, email, password_hash, push_token, created_at
        FROM app_users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Look up a user by id
pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, full_name, email, password_hash, push_token, created_at
        FROM app_users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Store or replace the user's push delivery token
pub async fn set_push_token(
    pool: &PgPool,
    user_id: i64,
    push_token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE app_users
        SET push_token = $2
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(push_token)
    .execute(pool)
    .await?;

    Ok(())
}
