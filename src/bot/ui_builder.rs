//! UI Builder module for creating keyboards and formatting messages

use rust_decimal::Decimal;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};
use teloxide::utils::html::escape;

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::callback_data::{AdminCallback, MenuCallback};
use crate::db::{CartProduct, Category, Product};

/// Buttons per row for menus built from a flat list
const ROW_SIZE: usize = 2;

/// Neighbouring pages of a paginated screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

fn menu_button(label: String, callback: MenuCallback) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, callback.to_string())
}

fn chunk_rows(buttons: Vec<InlineKeyboardButton>, size: usize) -> Vec<Vec<InlineKeyboardButton>> {
    buttons.chunks(size.max(1)).map(|row| row.to_vec()).collect()
}

/// Previous/next row; `template` supplies the level and category of the screen
fn pagination_row(
    links: PageLinks,
    template: &MenuCallback,
    language_code: Option<&str>,
) -> Vec<InlineKeyboardButton> {
    let mut row = Vec::new();

    if let Some(previous) = links.previous {
        let mut callback = template.clone().page(previous);
        callback.menu_name = "previous".to_string();
        row.push(menu_button(t_lang("btn-previous", language_code), callback));
    }

    if let Some(next) = links.next {
        let mut callback = template.clone().page(next);
        callback.menu_name = "next".to_string();
        row.push(menu_button(t_lang("btn-next", language_code), callback));
    }

    row
}

/// Home screen: catalog, cart and the info pages
pub fn main_menu_keyboard(level: u8, language_code: Option<&str>) -> InlineKeyboardMarkup {
    let buttons = vec![
        menu_button(
            t_lang("btn-products", language_code),
            MenuCallback::new(level + 1, "catalog"),
        ),
        menu_button(t_lang("btn-cart", language_code), MenuCallback::new(3, "cart")),
        menu_button(t_lang("btn-about", language_code), MenuCallback::new(level, "about")),
        menu_button(t_lang("btn-payment", language_code), MenuCallback::new(level, "payment")),
        menu_button(t_lang("btn-shipping", language_code), MenuCallback::new(level, "shipping")),
    ];

    InlineKeyboardMarkup::new(chunk_rows(buttons, ROW_SIZE))
}

/// Category list with back and cart buttons
pub fn catalog_keyboard(
    level: u8,
    categories: &[Category],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = vec![
        menu_button(
            t_lang("btn-back", language_code),
            MenuCallback::new(level.saturating_sub(1), "main"),
        ),
        menu_button(t_lang("btn-cart", language_code), MenuCallback::new(3, "cart")),
    ];

    for category in categories {
        buttons.push(InlineKeyboardButton::callback(
            category.name.clone(),
            MenuCallback::new(level + 1, "category")
                .category(category.id)
                .to_string(),
        ));
    }

    InlineKeyboardMarkup::new(chunk_rows(buttons, ROW_SIZE))
}

/// Product card buttons: back, cart, buy and paging
pub fn products_keyboard(
    level: u8,
    category: i32,
    page: usize,
    links: PageLinks,
    product_id: i32,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let buttons = vec![
        menu_button(
            t_lang("btn-back", language_code),
            MenuCallback::new(level.saturating_sub(1), "catalog"),
        ),
        menu_button(t_lang("btn-cart", language_code), MenuCallback::new(3, "cart")),
        menu_button(
            t_lang("btn-buy", language_code),
            MenuCallback::new(level, "add_to_cart")
                .category(category)
                .page(page)
                .product(product_id),
        ),
    ];

    let mut rows = chunk_rows(buttons, ROW_SIZE);
    let template = MenuCallback::new(level, "category").category(category);
    let paging = pagination_row(links, &template, language_code);
    if !paging.is_empty() {
        rows.push(paging);
    }

    InlineKeyboardMarkup::new(rows)
}

/// Buttons for a category without products
pub fn empty_category_keyboard(level: u8, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        menu_button(
            t_lang("btn-back", language_code),
            MenuCallback::new(level.saturating_sub(1), "catalog"),
        ),
        menu_button(t_lang("btn-cart", language_code), MenuCallback::new(3, "cart")),
    ]])
}

/// Cart buttons. `line` is the page and product shown; `None` for an empty cart.
pub fn cart_keyboard(
    level: u8,
    line: Option<(usize, i32)>,
    links: PageLinks,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let home = menu_button(t_lang("btn-home", language_code), MenuCallback::new(0, "main"));

    let Some((page, product_id)) = line else {
        return InlineKeyboardMarkup::new(vec![vec![home]]);
    };

    let action = |name: &str| MenuCallback::new(level, name).page(page).product(product_id);

    let mut rows = vec![vec![
        menu_button(t_lang("btn-delete", language_code), action("delete")),
        menu_button(t_lang("btn-decrement", language_code), action("decrement")),
        menu_button(t_lang("btn-increment", language_code), action("increment")),
    ]];

    let paging = pagination_row(links, &MenuCallback::new(level, "cart"), language_code);
    if !paging.is_empty() {
        rows.push(paging);
    }

    rows.push(vec![
        home,
        menu_button(t_lang("btn-order", language_code), MenuCallback::new(0, "order")),
    ]);

    InlineKeyboardMarkup::new(rows)
}

/// Reply keyboard of the admin menu
pub fn admin_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let buttons: Vec<KeyboardButton> = [
        "admin-btn-add-product",
        "admin-btn-assortment",
        "admin-btn-banner",
    ]
    .iter()
    .map(|key| KeyboardButton::new(t_lang(key, language_code)))
    .collect();

    let rows: Vec<Vec<KeyboardButton>> = buttons.chunks(ROW_SIZE).map(|row| row.to_vec()).collect();

    KeyboardMarkup::new(rows)
        .resize_keyboard()
        .input_field_placeholder(t_lang("admin-placeholder", language_code))
}

/// One button per category carrying the given admin action
pub fn admin_categories_keyboard(
    categories: &[Category],
    action: fn(i32) -> AdminCallback,
) -> InlineKeyboardMarkup {
    let buttons = categories
        .iter()
        .map(|category| {
            InlineKeyboardButton::callback(category.name.clone(), action(category.id).to_string())
        })
        .collect();

    InlineKeyboardMarkup::new(chunk_rows(buttons, ROW_SIZE))
}

/// Delete and edit buttons under an admin product card
pub fn admin_product_keyboard(product_id: i32, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            t_lang("admin-btn-delete", language_code),
            AdminCallback::DeleteProduct(product_id).to_string(),
        ),
        InlineKeyboardButton::callback(
            t_lang("admin-btn-edit", language_code),
            AdminCallback::EditProduct(product_id).to_string(),
        ),
    ]])
}

pub fn format_price(price: Decimal) -> String {
    price.round_dp(2).to_string()
}

/// HTML caption of a product card
pub fn format_product_caption(product: &Product, language_code: Option<&str>) -> String {
    t_args_lang(
        "product-caption",
        &[
            ("name", &escape(&product.name)),
            ("description", &escape(&product.description)),
            ("price", &format_price(product.price)),
        ],
        language_code,
    )
}

/// HTML caption of one cart line plus the cart position and total
pub fn format_cart_caption(
    line: &CartProduct,
    page: usize,
    pages: usize,
    total: Decimal,
    language_code: Option<&str>,
) -> String {
    let line_text = t_args_lang(
        "cart-line",
        &[
            ("name", &escape(&line.name)),
            ("price", &format_price(line.price)),
            ("quantity", &line.quantity.to_string()),
            ("line_total", &format_price(line.line_total())),
        ],
        language_code,
    );

    let position = t_args_lang(
        "cart-position",
        &[
            ("page", &page.to_string()),
            ("pages", &pages.to_string()),
            ("total", &format_price(total)),
        ],
        language_code,
    );

    format!("{line_text}\n\n{position}")
}
