//! # Menu Content Module
//!
//! Resolves a [`MenuCallback`] to what the user menu should display: an optional
//! photo, an HTML caption and an inline keyboard.
//!
//! Levels: 0 = home and info pages, 1 = catalog, 2 = products of a category,
//! 3 = cart. The cart level applies `delete`/`decrement`/`increment` before
//! rendering.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::utils::html::escape;
use tracing::{debug, warn};

use crate::bot::ui_builder::{
    cart_keyboard, catalog_keyboard, empty_category_keyboard, format_cart_caption,
    format_product_caption, main_menu_keyboard, products_keyboard, PageLinks,
};
use crate::callback_data::MenuCallback;
use crate::db::Banner;
use crate::errors::MenuError;
use crate::localization::{t_args_lang, t_lang};
use crate::paginator::Paginator;
use crate::services::{banner, cart, category, product};

/// A screen of the user menu
#[derive(Debug, Clone)]
pub struct MenuContent {
    /// Telegram file id of the photo; `None` renders as a text message
    pub image: Option<String>,
    pub caption: String,
    pub keyboard: InlineKeyboardMarkup,
}

fn page_links<T>(paginator: &Paginator<'_, T>) -> PageLinks {
    PageLinks {
        previous: paginator.has_previous(),
        next: paginator.has_next(),
    }
}

/// Keep `page` within `1..=pages` (or 1 when there are no pages)
fn clamp_page(page: usize, pages: usize) -> usize {
    page.clamp(1, pages.max(1))
}

async fn load_banner(conn: &mut PgConnection, page: &str) -> Result<Banner, MenuError> {
    banner::get_banner(conn, page)
        .await?
        .ok_or_else(|| MenuError::MissingBanner(page.to_string()))
}

/// Level 0: banner page named `menu_name` with the main keyboard
pub async fn main_menu(
    conn: &mut PgConnection,
    level: u8,
    menu_name: &str,
    language_code: Option<&str>,
) -> Result<MenuContent, MenuError> {
    let banner = load_banner(conn, menu_name).await?;

    Ok(MenuContent {
        image: banner.image,
        caption: banner.description.unwrap_or_default(),
        keyboard: main_menu_keyboard(level, language_code),
    })
}

/// Level 1: catalog banner with one button per category
pub async fn catalog(
    conn: &mut PgConnection,
    level: u8,
    menu_name: &str,
    language_code: Option<&str>,
) -> Result<MenuContent, MenuError> {
    let banner = load_banner(conn, menu_name).await?;
    let categories = category::get_categories(conn).await?;

    Ok(MenuContent {
        image: banner.image,
        caption: banner.description.unwrap_or_default(),
        keyboard: catalog_keyboard(level, &categories, language_code),
    })
}

/// Level 2: one product of a category per page
pub async fn products(
    conn: &mut PgConnection,
    level: u8,
    category: i32,
    page: usize,
    language_code: Option<&str>,
) -> Result<MenuContent, MenuError> {
    let products = product::get_all_products(conn, category).await?;

    if products.is_empty() {
        debug!(category, "Category has no products");
        let banner = load_banner(conn, "catalog").await?;
        return Ok(MenuContent {
            image: banner.image,
            caption: t_lang("category-empty", language_code),
            keyboard: empty_category_keyboard(level, language_code),
        });
    }

    let paginator = Paginator::new(&products, clamp_page(page, products.len()));
    let Some(item) = paginator.get_page().first() else {
        return Err(MenuError::EmptyPage(paginator.page()));
    };

    let position = t_args_lang(
        "product-position",
        &[
            ("page", &paginator.page().to_string()),
            ("pages", &paginator.pages().to_string()),
        ],
        language_code,
    );

    Ok(MenuContent {
        image: Some(item.image.clone()),
        caption: format!("{}\n\n{}", format_product_caption(item, language_code), position),
        keyboard: products_keyboard(
            level,
            category,
            paginator.page(),
            page_links(&paginator),
            item.id,
            language_code,
        ),
    })
}

/// Level 3: apply the cart action, then show one cart line per page
pub async fn carts(
    conn: &mut PgConnection,
    level: u8,
    menu_name: &str,
    page: usize,
    user_id: i64,
    product_id: Option<i32>,
    language_code: Option<&str>,
) -> Result<MenuContent, MenuError> {
    let mut page = page;

    match (menu_name, product_id) {
        ("delete", Some(product_id)) => {
            cart::delete_from_cart(conn, user_id, product_id).await?;
            if page > 1 {
                page -= 1;
            }
        }
        ("decrement", Some(product_id)) => {
            let still_in_cart = cart::reduce_product_in_cart(conn, user_id, product_id).await?;
            if page > 1 && !still_in_cart {
                page -= 1;
            }
        }
        ("increment", Some(product_id)) => {
            cart::add_to_cart(conn, user_id, product_id).await?;
        }
        ("delete" | "decrement" | "increment", None) => {
            warn!(user_id, action = menu_name, "Cart action without a product");
        }
        _ => {}
    }

    let lines = cart::get_user_carts(conn, user_id).await?;

    if lines.is_empty() {
        let banner = load_banner(conn, "cart").await?;
        let description = banner.description.unwrap_or_default();
        return Ok(MenuContent {
            image: banner.image,
            caption: format!("<strong>{}</strong>", escape(&description)),
            keyboard: cart_keyboard(level, None, PageLinks::default(), language_code),
        });
    }

    let paginator = Paginator::new(&lines, clamp_page(page, lines.len()));
    let Some(line) = paginator.get_page().first() else {
        return Err(MenuError::EmptyPage(paginator.page()));
    };

    let total: Decimal = lines.iter().map(|line| line.line_total()).sum();

    Ok(MenuContent {
        image: Some(line.image.clone()),
        caption: format_cart_caption(line, paginator.page(), paginator.pages(), total, language_code),
        keyboard: cart_keyboard(
            level,
            Some((paginator.page(), line.product_id)),
            page_links(&paginator),
            language_code,
        ),
    })
}

/// Dispatch a menu token to the screen builder for its level
pub async fn get_menu_content(
    conn: &mut PgConnection,
    callback: &MenuCallback,
    user_id: Option<i64>,
    language_code: Option<&str>,
) -> Result<MenuContent, MenuError> {
    match callback.level {
        0 => main_menu(conn, callback.level, &callback.menu_name, language_code).await,
        1 => catalog(conn, callback.level, &callback.menu_name, language_code).await,
        2 => {
            let category = callback.category.ok_or(MenuError::MissingCategory)?;
            products(conn, callback.level, category, callback.page, language_code).await
        }
        3 => {
            let user_id = user_id.ok_or(MenuError::MissingUser)?;
            carts(
                conn,
                callback.level,
                &callback.menu_name,
                callback.page,
                user_id,
                callback.product_id,
                language_code,
            )
            .await
        }
        other => Err(MenuError::UnknownLevel(other)),
    }
}
