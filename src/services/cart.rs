//! Cart operations. A (user, product) pair has at most one line and a line's
//! quantity never drops below one; reaching zero deletes the line.

use sqlx::PgConnection;
use tracing::debug;

use crate::db::{eq, get_one, Cart, CartProduct};
use crate::errors::StoreResult;

async fn get_cart_line(conn: &mut PgConnection, user_id: i64, product_id: i32) -> StoreResult<Option<Cart>> {
    get_one(conn, &[eq("user_id", user_id), eq("product_id", product_id)]).await
}

/// Insert a line with quantity 1, or increment the existing one
pub async fn add_to_cart(conn: &mut PgConnection, user_id: i64, product_id: i32) -> StoreResult<Cart> {
    let cart = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (user_id, product_id, quantity)
         VALUES ($1, $2, 1)
         ON CONFLICT (user_id, product_id)
         DO UPDATE SET quantity = carts.quantity + 1, updated_at = NOW()
         RETURNING id, user_id, product_id, quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    debug!(user_id, product_id, quantity = cart.quantity, "Added to cart");
    Ok(cart)
}

/// Cart lines of a user with their products, oldest line first
pub async fn get_user_carts(conn: &mut PgConnection, user_id: i64) -> StoreResult<Vec<CartProduct>> {
    let lines = sqlx::query_as::<_, CartProduct>(
        "SELECT c.product_id, c.quantity, p.name, p.price, p.image
         FROM carts c
         JOIN products p ON p.id = c.product_id
         WHERE c.user_id = $1
         ORDER BY c.id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

/// Remove a line; removing a missing line is a no-op
pub async fn delete_from_cart(conn: &mut PgConnection, user_id: i64, product_id: i32) -> StoreResult<()> {
    sqlx::query("DELETE FROM carts WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    debug!(user_id, product_id, "Removed from cart");
    Ok(())
}

/// Decrement a line, deleting it when the quantity would reach zero.
/// Returns whether the line still exists afterwards.
pub async fn reduce_product_in_cart(conn: &mut PgConnection, user_id: i64, product_id: i32) -> StoreResult<bool> {
    let Some(cart) = get_cart_line(conn, user_id, product_id).await? else {
        return Ok(false);
    };

    if cart.quantity > 1 {
        sqlx::query("UPDATE carts SET quantity = quantity - 1, updated_at = NOW() WHERE id = $1")
            .bind(cart.id)
            .execute(&mut *conn)
            .await?;
        return Ok(true);
    }

    delete_from_cart(conn, user_id, product_id).await?;
    Ok(false)
}
