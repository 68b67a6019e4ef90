//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, FileId, InputFile, InputMedia, InputMediaPhoto, ParseMode};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::t_lang;

use crate::callback_data::{AdminCallback, MenuCallback};
use crate::config::BotConfig;
use crate::dialogue::{AdminDialogue, AdminDialogueState};
use crate::errors::StoreError;
use crate::menu::{get_menu_content, MenuContent};
use crate::services::{cart, product, user};
use crate::wizard::{WizardContext, WizardInput};

use super::dialogue_manager::{handle_wizard_input, start_product_wizard};
use super::message_handler::{send_menu_content, user_language};
use super::ui_builder::{admin_product_keyboard, format_product_caption};

/// Show `content` in place of the menu message the button belonged to.
/// Photo-to-photo updates edit the media; otherwise the old message is replaced.
async fn replace_menu_message(bot: &Bot, msg: &Message, content: MenuContent) -> Result<()> {
    let chat_id = msg.chat.id;

    match (&content.image, msg.photo().is_some()) {
        (Some(image), true) => {
            let media = InputMedia::Photo(
                InputMediaPhoto::new(InputFile::file_id(FileId(image.clone())))
                    .caption(content.caption)
                    .parse_mode(ParseMode::Html),
            );
            bot.edit_message_media(chat_id, msg.id, media)
                .reply_markup(content.keyboard)
                .await?;
        }
        (None, false) => {
            bot.edit_message_text(chat_id, msg.id, content.caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(content.keyboard)
                .await?;
        }
        _ => {
            if let Err(e) = bot.delete_message(chat_id, msg.id).await {
                warn!(chat_id = %chat_id, error = %e, "Failed to delete previous menu message");
            }
            send_menu_content(bot, chat_id, content).await?;
        }
    }

    Ok(())
}

async fn handle_add_to_cart(
    bot: &Bot,
    q: &CallbackQuery,
    callback: &MenuCallback,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(product_id) = callback.product_id else {
        warn!(user_id = %q.from.id, "add_to_cart without a product");
        bot.answer_callback_query(q.id.clone())
            .text(t_lang("callback-invalid", language_code))
            .await?;
        return Ok(());
    };

    let telegram_id = q.from.id.0 as i64;
    let outcome = async {
        let mut tx = pool.begin().await?;
        user::add_user(
            &mut tx,
            telegram_id,
            Some(q.from.first_name.as_str()),
            q.from.last_name.as_deref(),
            None,
        )
        .await?;
        cart::add_to_cart(&mut tx, telegram_id, product_id).await?;
        tx.commit().await?;
        Ok::<_, StoreError>(())
    }
    .await;

    if let Err(e) = outcome {
        // Usually a product deleted after the menu was rendered
        warn!(user_id = telegram_id, product_id, error = %e, "Failed to add product to cart");
        bot.answer_callback_query(q.id.clone())
            .text(t_lang("callback-invalid", language_code))
            .await?;
        return Ok(());
    }

    info!(user_id = telegram_id, product_id, "Product added to cart");
    bot.answer_callback_query(q.id.clone())
        .text(t_lang("added-to-cart", language_code))
        .await?;
    Ok(())
}

async fn handle_menu_callback(
    bot: &Bot,
    q: &CallbackQuery,
    callback: MenuCallback,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    if callback.menu_name == "add_to_cart" {
        return handle_add_to_cart(bot, q, &callback, pool, language_code).await;
    }

    let Some(msg) = q.regular_message() else {
        debug!(user_id = %q.from.id, "Callback without an accessible message");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let mut tx = pool.begin().await?;
    let content = get_menu_content(&mut tx, &callback, Some(q.from.id.0 as i64), language_code).await;

    match content {
        Ok(content) => {
            tx.commit().await?;
            replace_menu_message(bot, msg, content).await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Err(e) => {
            error!(user_id = %q.from.id, callback = %callback, error = %e, "Failed to build menu");
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("menu-unavailable", language_code))
                .await?;
        }
    }

    Ok(())
}

async fn show_category_products(
    bot: &Bot,
    chat_id: ChatId,
    category_id: i32,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    let mut conn = pool.acquire().await?;
    let products = product::get_all_products(&mut conn, category_id).await?;

    if products.is_empty() {
        bot.send_message(chat_id, t_lang("admin-assortment-empty", language_code))
            .await?;
        return Ok(());
    }

    for item in &products {
        bot.send_photo(chat_id, InputFile::file_id(FileId(item.image.clone())))
            .caption(format_product_caption(item, language_code))
            .parse_mode(ParseMode::Html)
            .reply_markup(admin_product_keyboard(item.id, language_code))
            .await?;
    }

    bot.send_message(chat_id, t_lang("admin-assortment-done", language_code))
        .await?;
    Ok(())
}

async fn handle_admin_callback(
    bot: &Bot,
    q: &CallbackQuery,
    callback: AdminCallback,
    pool: &PgPool,
    dialogue: AdminDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();

    match callback {
        AdminCallback::Category(category_id) => {
            bot.answer_callback_query(q.id.clone()).await?;
            show_category_products(bot, chat_id, category_id, pool, language_code).await?;
        }
        AdminCallback::DeleteProduct(product_id) => {
            let mut tx = pool.begin().await?;
            let deleted = product::delete_product(&mut tx, product_id).await;
            let key = match deleted {
                Ok(()) => {
                    tx.commit().await?;
                    info!(user_id = %q.from.id, product_id, "Product deleted");
                    "admin-product-deleted"
                }
                Err(e) if e.is_not_found() => "admin-product-not-found",
                Err(e) => return Err(e.into()),
            };
            bot.answer_callback_query(q.id.clone())
                .text(t_lang(key, language_code))
                .await?;
            bot.send_message(chat_id, t_lang(key, language_code)).await?;
        }
        AdminCallback::EditProduct(product_id) => {
            let mut conn = pool.acquire().await?;
            let found = product::get_one_product(&mut conn, product_id).await?;
            drop(conn);

            match found {
                Some(item) => {
                    bot.answer_callback_query(q.id.clone()).await?;
                    start_product_wizard(bot, chat_id, dialogue, WizardContext::edit(item), pool, language_code)
                        .await?;
                }
                None => {
                    bot.answer_callback_query(q.id.clone())
                        .text(t_lang("admin-product-not-found", language_code))
                        .await?;
                }
            }
        }
        AdminCallback::PickCategory(category_id) => {
            bot.answer_callback_query(q.id.clone()).await?;
            match dialogue.get().await? {
                Some(AdminDialogueState::ProductWizard(context)) => {
                    let input = WizardInput::CategorySelected(category_id);
                    handle_wizard_input(bot, chat_id, dialogue, context, input, pool, language_code).await?;
                }
                _ => debug!(user_id = %q.from.id, category_id, "Category picked outside the wizard"),
            }
        }
    }

    Ok(())
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    pool: Arc<PgPool>,
    config: Arc<BotConfig>,
    dialogue: AdminDialogue,
) -> Result<()> {
    let data = q.data.clone().unwrap_or_default();
    let language_code = user_language(Some(&q.from), &config);
    debug!(user_id = %q.from.id, data = %data, "Received callback query from user");

    if MenuCallback::is_menu_token(&data) {
        return match data.parse::<MenuCallback>() {
            Ok(callback) => handle_menu_callback(&bot, &q, callback, &pool, language_code).await,
            Err(e) => {
                warn!(user_id = %q.from.id, data = %data, error = %e, "Malformed menu callback");
                bot.answer_callback_query(q.id.clone())
                    .text(t_lang("callback-invalid", language_code))
                    .await?;
                Ok(())
            }
        };
    }

    match data.parse::<AdminCallback>() {
        Ok(callback) if config.is_admin(q.from.id.0) => {
            handle_admin_callback(&bot, &q, callback, &pool, dialogue, language_code).await
        }
        Ok(callback) => {
            warn!(user_id = %q.from.id, callback = ?callback, "Admin callback from a non-admin");
            bot.answer_callback_query(q.id.clone()).await?;
            Ok(())
        }
        Err(e) => {
            warn!(user_id = %q.from.id, data = %data, error = %e, "Unrecognised callback");
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("callback-invalid", language_code))
                .await?;
            Ok(())
        }
    }
}
