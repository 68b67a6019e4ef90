//! Default rows inserted at startup when their tables are empty.

use sqlx::PgConnection;

use crate::errors::StoreResult;
use crate::services::{banner, category};

pub const DEFAULT_CATEGORIES: &[&str] = &["Food", "Drinks"];

/// Banner pages with their default captions. The page names are the menu names
/// used by the main menu and by the cart/catalog screens.
pub const DEFAULT_BANNERS: &[(&str, &str)] = &[
    ("main", "Welcome!"),
    ("about", "Pizzeria \"Tasty\". Open daily from 10:00 to 23:00."),
    ("payment", "Payment options:\n- card in the bot\n- card or cash on delivery\n- at the venue"),
    ("shipping", "Delivery options:\n- courier\n- pickup\n- eat in"),
    ("catalog", "Categories:"),
    ("cart", "Your cart is empty!"),
    ("order", "Thank you! We will contact you to confirm the order."),
];

/// Seed categories and banners, each only if its table is empty
pub async fn seed_defaults(conn: &mut PgConnection) -> StoreResult<()> {
    banner::add_banners(conn, DEFAULT_BANNERS).await?;
    category::create_categories(conn, DEFAULT_CATEGORIES).await?;
    Ok(())
}
