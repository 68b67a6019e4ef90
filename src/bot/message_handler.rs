//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, ParseMode, User};
use tracing::{debug, error, info};

// Import localization
use crate::localization::t_lang;

use crate::callback_data::{AdminCallback, MenuCallback};
use crate::config::BotConfig;
use crate::dialogue::{is_start_command, parse_control_command, AdminDialogue, AdminDialogueState, ControlCommand};
use crate::menu::{get_menu_content, MenuContent};
use crate::services::category;
use crate::wizard::{WizardContext, WizardInput};

// Import dialogue manager functions
use super::dialogue_manager::{
    cancel_dialogue, handle_banner_photo, handle_wizard_input, start_banner_upload,
    start_product_wizard,
};

// Import UI builder functions
use super::ui_builder::{admin_categories_keyboard, admin_keyboard};

/// Language code of a Telegram user, falling back to the configured default
pub fn user_language<'a>(user: Option<&'a User>, config: &'a BotConfig) -> Option<&'a str> {
    user.and_then(|user| user.language_code.as_deref())
        .or(Some(config.default_language.as_str()))
}

/// Send a menu screen as a new message: a photo when it has one, text otherwise
pub async fn send_menu_content(bot: &Bot, chat_id: ChatId, content: MenuContent) -> Result<()> {
    match content.image {
        Some(image) => {
            bot.send_photo(chat_id, InputFile::file_id(FileId(image)))
                .caption(content.caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(content.keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, content.caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(content.keyboard)
                .await?;
        }
    }
    Ok(())
}

async fn handle_start(bot: &Bot, msg: &Message, pool: &PgPool, language_code: Option<&str>) -> Result<()> {
    let mut conn = pool.acquire().await?;
    let root = MenuCallback::new(0, "main");
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64);

    match get_menu_content(&mut conn, &root, user_id, language_code).await {
        Ok(content) => send_menu_content(bot, msg.chat.id, content).await?,
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to build main menu");
            bot.send_message(msg.chat.id, t_lang("menu-unavailable", language_code))
                .await?;
        }
    }

    Ok(())
}

async fn show_assortment_categories(
    bot: &Bot,
    chat_id: ChatId,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    let mut conn = pool.acquire().await?;
    let categories = category::get_categories(&mut conn).await?;
    bot.send_message(chat_id, t_lang("admin-choose-category", language_code))
        .reply_markup(admin_categories_keyboard(&categories, AdminCallback::Category))
        .await?;
    Ok(())
}

/// Admin commands typed or pressed on the reply keyboard. Returns `false`
/// when the text is not an admin command.
async fn handle_admin_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: AdminDialogue,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<bool> {
    let chat_id = msg.chat.id;

    if text == "/admin" {
        bot.send_message(chat_id, t_lang("admin-menu-prompt", language_code))
            .reply_markup(admin_keyboard(language_code))
            .await?;
    } else if text == t_lang("admin-btn-add-product", language_code) {
        start_product_wizard(bot, chat_id, dialogue, WizardContext::create(), pool, language_code).await?;
    } else if text == t_lang("admin-btn-assortment", language_code) {
        show_assortment_categories(bot, chat_id, pool, language_code).await?;
    } else if text == t_lang("admin-btn-banner", language_code) {
        start_banner_upload(bot, chat_id, dialogue, pool, language_code).await?;
    } else {
        return Ok(false);
    }

    Ok(true)
}

/// Route a message of an admin with an active dialogue
async fn handle_active_dialogue(
    bot: &Bot,
    msg: &Message,
    state: AdminDialogueState,
    dialogue: AdminDialogue,
    pool: Arc<PgPool>,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let control = msg
        .text()
        .and_then(|text| parse_control_command(text, language_code));

    match (state, control) {
        (_, Some(ControlCommand::Cancel)) => {
            cancel_dialogue(bot, chat_id, dialogue, language_code).await?;
        }
        (AdminDialogueState::ProductWizard(context), Some(ControlCommand::Back)) => {
            handle_wizard_input(bot, chat_id, dialogue, context, WizardInput::Back, &pool, language_code).await?;
        }
        (AdminDialogueState::ProductWizard(context), None) => {
            let input = if let Some(text) = msg.text() {
                WizardInput::Text(text.to_string())
            } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
                WizardInput::Photo(photo.file.id.to_string())
            } else {
                WizardInput::Unsupported
            };
            handle_wizard_input(bot, chat_id, dialogue, context, input, &pool, language_code).await?;
        }
        (AdminDialogueState::AwaitingBanner, Some(ControlCommand::Back)) => {
            bot.send_message(chat_id, t_lang("banner-photo-required", language_code))
                .await?;
        }
        (AdminDialogueState::AwaitingBanner, None) => {
            handle_banner_photo(bot, msg, dialogue, pool, language_code).await?;
        }
        (AdminDialogueState::Idle, _) => {
            debug!(user_id = %chat_id, "Idle dialogue routed as active");
        }
    }

    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: Arc<PgPool>,
    config: Arc<BotConfig>,
    dialogue: AdminDialogue,
) -> Result<()> {
    if !msg.chat.is_private() {
        debug!(chat_id = %msg.chat.id, "Ignoring message outside a private chat");
        return Ok(());
    }

    let language_code = user_language(msg.from.as_ref(), &config);
    let is_admin = msg
        .from
        .as_ref()
        .is_some_and(|user| config.is_admin(user.id.0));

    // The main menu is always reachable, even in the middle of an admin dialogue
    if msg.text().is_some_and(is_start_command) {
        info!(user_id = %msg.chat.id, "Start command");
        return handle_start(&bot, &msg, &pool, language_code).await;
    }

    if is_admin {
        let state = dialogue.get().await?.unwrap_or_default();
        if state.is_active() {
            return handle_active_dialogue(&bot, &msg, state, dialogue, pool, language_code).await;
        }
    }

    let Some(text) = msg.text() else {
        debug!(user_id = %msg.chat.id, "Ignoring non-text message");
        return Ok(());
    };

    if is_admin && handle_admin_text(&bot, &msg, text, dialogue, &pool, language_code).await? {
        return Ok(());
    }

    debug!(user_id = %msg.chat.id, "Unhandled text message");
    Ok(())
}
