//! Dialogue Manager module for the admin conversations: the product wizard and
//! the banner upload.

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::KeyboardRemove;
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::callback_data::AdminCallback;
use crate::dialogue::{validate_banner_page, AdminDialogue, AdminDialogueState};
use crate::errors::StoreError;
use crate::services::{banner, category, product};
use crate::wizard::{Rejection, Step, Submission, Transition, WizardContext, WizardInput};

use super::ui_builder::{admin_categories_keyboard, admin_keyboard};

/// Localized text for a rejected wizard input
pub fn rejection_message(rejection: &Rejection, language_code: Option<&str>) -> String {
    let key = match rejection {
        Rejection::NameTooLong => "wizard-name-too-long",
        Rejection::InvalidPrice => "wizard-invalid-price",
        Rejection::PriceOutOfRange => "wizard-price-out-of-range",
        Rejection::UnknownCategory => "wizard-unknown-category",
        Rejection::SkipNotAllowed => "wizard-skip-not-allowed",
        Rejection::NoPreviousStep => "wizard-no-previous-step",
        Rejection::UnexpectedInput(Step::Name) => "wizard-invalid-name",
        Rejection::UnexpectedInput(Step::Description) => "wizard-invalid-description",
        Rejection::UnexpectedInput(Step::Category) => "wizard-unknown-category",
        Rejection::UnexpectedInput(Step::Price) => "wizard-invalid-price-input",
        Rejection::UnexpectedInput(Step::Image) => "wizard-invalid-image",
        Rejection::MissingField(_) => "wizard-missing-field",
    };
    t_lang(key, language_code)
}

fn prompt_key(step: Step) -> &'static str {
    match step {
        Step::Name => "wizard-prompt-name",
        Step::Description => "wizard-prompt-description",
        Step::Category => "wizard-prompt-category",
        Step::Price => "wizard-prompt-price",
        Step::Image => "wizard-prompt-image",
    }
}

/// Ask for the value of the current step
pub async fn send_step_prompt(
    bot: &Bot,
    chat_id: ChatId,
    context: &WizardContext,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    let mut prompt = t_lang(prompt_key(context.step), language_code);
    if context.editing().is_some() {
        prompt = format!("{}\n{}", prompt, t_lang("wizard-edit-hint", language_code));
    }

    match context.step {
        Step::Category => {
            let mut conn = pool.acquire().await?;
            let categories = category::get_categories(&mut conn).await?;
            bot.send_message(chat_id, prompt)
                .reply_markup(admin_categories_keyboard(&categories, AdminCallback::PickCategory))
                .await?;
        }
        Step::Name => {
            bot.send_message(chat_id, prompt)
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        _ => {
            bot.send_message(chat_id, prompt).await?;
        }
    }

    Ok(())
}

/// Enter the product wizard with a fresh context
pub async fn start_product_wizard(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: AdminDialogue,
    context: WizardContext,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    info!(
        user_id = %chat_id,
        editing = ?context.editing().map(|p| p.id),
        "Starting product wizard"
    );
    send_step_prompt(bot, chat_id, &context, pool, language_code).await?;
    dialogue.update(AdminDialogueState::ProductWizard(context)).await?;
    Ok(())
}

/// Feed one input to the wizard and act on the resulting transition
pub async fn handle_wizard_input(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: AdminDialogue,
    context: WizardContext,
    input: WizardInput,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    let category_ids = if context.step == Step::Category {
        let mut conn = pool.acquire().await?;
        category::get_category_ids(&mut conn).await?
    } else {
        Vec::new()
    };

    debug!(user_id = %chat_id, step = ?context.step, input = ?input, "Wizard input");

    match context.handle(input, &category_ids) {
        Transition::Advanced(next) => {
            send_step_prompt(bot, chat_id, &next, pool, language_code).await?;
            dialogue.update(AdminDialogueState::ProductWizard(next)).await?;
        }
        Transition::SteppedBack(previous) => {
            bot.send_message(chat_id, t_lang("wizard-back", language_code)).await?;
            send_step_prompt(bot, chat_id, &previous, pool, language_code).await?;
            dialogue.update(AdminDialogueState::ProductWizard(previous)).await?;
        }
        Transition::Rejected(current, rejection) => {
            debug!(user_id = %chat_id, rejection = ?rejection, "Wizard input rejected");
            bot.send_message(chat_id, rejection_message(&rejection, language_code))
                .await?;
            if matches!(rejection, Rejection::MissingField(_)) {
                send_step_prompt(bot, chat_id, &current, pool, language_code).await?;
            }
            dialogue.update(AdminDialogueState::ProductWizard(current)).await?;
        }
        Transition::Cancelled => {
            cancel_dialogue(bot, chat_id, dialogue, language_code).await?;
        }
        Transition::Completed(submission) => {
            save_submission(bot, chat_id, dialogue, pool, submission, language_code).await?;
        }
    }

    Ok(())
}

/// Persist a finished wizard in one transaction, leave the wizard whatever the
/// outcome, then report it
pub async fn save_submission(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: AdminDialogue,
    pool: &PgPool,
    submission: Submission,
    language_code: Option<&str>,
) -> Result<()> {
    let outcome = async {
        let mut tx = pool.begin().await?;
        let saved = product::persist_submission(&mut tx, &submission).await?;
        tx.commit().await?;
        Ok::<_, StoreError>(saved)
    }
    .await;

    dialogue.exit().await?;

    let reply = match outcome {
        Ok(saved) => {
            info!(user_id = %chat_id, product_id = saved.id, "Product saved");
            t_lang("wizard-saved", language_code)
        }
        Err(e) if e.is_not_found() => {
            warn!(user_id = %chat_id, error = %e, "Edited product no longer exists");
            t_lang("admin-product-not-found", language_code)
        }
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to save product");
            t_args_lang("wizard-save-failed", &[("error", &e.to_string())], language_code)
        }
    };

    bot.send_message(chat_id, reply)
        .reply_markup(admin_keyboard(language_code))
        .await?;

    Ok(())
}

/// Leave any admin state and bring back the admin keyboard
pub async fn cancel_dialogue(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: AdminDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    dialogue.exit().await?;
    info!(user_id = %chat_id, "Admin dialogue cancelled");
    bot.send_message(chat_id, t_lang("wizard-cancelled", language_code))
        .reply_markup(admin_keyboard(language_code))
        .await?;
    Ok(())
}

fn page_list(pages: &[String]) -> String {
    pages.join(", ")
}

async fn banner_pages(pool: &PgPool) -> Result<Vec<String>> {
    let mut conn = pool.acquire().await?;
    let pages = banner::get_info_pages(&mut conn)
        .await?
        .into_iter()
        .map(|banner| banner.name)
        .collect();
    Ok(pages)
}

/// Ask for a banner photo captioned with a page name
pub async fn start_banner_upload(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: AdminDialogue,
    pool: &PgPool,
    language_code: Option<&str>,
) -> Result<()> {
    let pages = banner_pages(pool).await?;
    bot.send_message(
        chat_id,
        t_args_lang("banner-prompt", &[("pages", &page_list(&pages))], language_code),
    )
    .reply_markup(KeyboardRemove::new())
    .await?;
    dialogue.update(AdminDialogueState::AwaitingBanner).await?;
    Ok(())
}

/// Store the photo of a banner message under the page named in its caption
pub async fn handle_banner_photo(
    bot: &Bot,
    msg: &Message,
    dialogue: AdminDialogue,
    pool: Arc<PgPool>,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        bot.send_message(msg.chat.id, t_lang("banner-photo-required", language_code))
            .await?;
        return Ok(());
    };

    let pages = banner_pages(&pool).await?;
    let page = match validate_banner_page(msg.caption(), &pages) {
        Ok(page) => page,
        Err(reason) => {
            debug!(user_id = %msg.chat.id, reason, "Banner caption rejected");
            bot.send_message(
                msg.chat.id,
                t_args_lang("banner-invalid-page", &[("pages", &page_list(&pages))], language_code),
            )
            .await?;
            return Ok(());
        }
    };

    save_banner_image(
        bot,
        msg.chat.id,
        dialogue,
        &pool,
        &page,
        &photo.file.id.to_string(),
        language_code,
    )
    .await
}

/// Store a banner image, leave the upload dialogue, then confirm
pub async fn save_banner_image(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: AdminDialogue,
    pool: &PgPool,
    page: &str,
    file_id: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    banner::change_banner_image(&mut tx, page, file_id).await?;
    tx.commit().await?;
    info!(user_id = %chat_id, page, "Banner image changed");

    dialogue.exit().await?;

    bot.send_message(chat_id, t_lang("banner-saved", language_code))
        .reply_markup(admin_keyboard(language_code))
        .await?;

    Ok(())
}
