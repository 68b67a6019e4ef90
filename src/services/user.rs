use sqlx::PgConnection;
use tracing::debug;

use crate::db::{eq, get_one, User};
use crate::errors::{StoreError, StoreResult};

/// Register a Telegram user on first interaction; existing users are left as-is
pub async fn add_user(
    conn: &mut PgConnection,
    telegram_id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
    phone: Option<&str>,
) -> StoreResult<User> {
    let inserted = sqlx::query(
        "INSERT INTO users (telegram_id, first_name, last_name, phone)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (telegram_id) DO NOTHING",
    )
    .bind(telegram_id)
    .bind(first_name)
    .bind(last_name)
    .bind(phone)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted > 0 {
        debug!(telegram_id, "Registered new user");
    }

    get_user(conn, telegram_id)
        .await?
        .ok_or_else(|| StoreError::not_found("User", telegram_id))
}

pub async fn get_user(conn: &mut PgConnection, telegram_id: i64) -> StoreResult<Option<User>> {
    get_one(conn, &[eq("telegram_id", telegram_id)]).await
}
