//! Info page banners

use sqlx::PgConnection;
use tracing::info;

use crate::db::{eq, get_all, get_first, get_one, Banner};
use crate::errors::{StoreError, StoreResult};

/// Insert `(page name, description)` banners unless the table already has rows.
/// Returns whether anything was inserted.
pub async fn add_banners(conn: &mut PgConnection, pages: &[(&str, &str)]) -> StoreResult<bool> {
    if get_first::<Banner>(conn).await?.is_some() {
        return Ok(false);
    }

    for (name, description) in pages {
        sqlx::query("INSERT INTO banners (name, description) VALUES ($1, $2)")
            .bind(*name)
            .bind(*description)
            .execute(&mut *conn)
            .await?;
    }

    info!(count = pages.len(), "Seeded banners");
    Ok(true)
}

pub async fn change_banner_image(conn: &mut PgConnection, page: &str, image: &str) -> StoreResult<()> {
    let result = sqlx::query("UPDATE banners SET image = $1, updated_at = NOW() WHERE name = $2")
        .bind(image)
        .bind(page)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("Banner", page));
    }

    info!(page, "Banner image changed");
    Ok(())
}

pub async fn get_banner(conn: &mut PgConnection, page: &str) -> StoreResult<Option<Banner>> {
    get_one(conn, &[eq("name", page)]).await
}

pub async fn get_info_pages(conn: &mut PgConnection) -> StoreResult<Vec<Banner>> {
    get_all(conn, &[]).await
}
