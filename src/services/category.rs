use sqlx::PgConnection;
use tracing::info;

use crate::db::{get_all, get_first, Category};
use crate::errors::StoreResult;

pub async fn get_categories(conn: &mut PgConnection) -> StoreResult<Vec<Category>> {
    get_all(conn, &[]).await
}

/// Ids of every category, used to validate a wizard selection
pub async fn get_category_ids(conn: &mut PgConnection) -> StoreResult<Vec<i32>> {
    Ok(get_categories(conn).await?.into_iter().map(|c| c.id).collect())
}

/// Insert the given categories unless the table already has rows.
/// Returns whether anything was inserted.
pub async fn create_categories(conn: &mut PgConnection, names: &[&str]) -> StoreResult<bool> {
    if get_first::<Category>(conn).await?.is_some() {
        return Ok(false);
    }

    for name in names {
        sqlx::query("INSERT INTO categories (name) VALUES ($1)")
            .bind(*name)
            .execute(&mut *conn)
            .await?;
    }

    info!(count = names.len(), "Seeded categories");
    Ok(true)
}
