//! Admin dialogue module: per-chat conversation state for the admin flows.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::localization::t_lang;
use crate::wizard::WizardContext;

/// Represents the conversation state of one admin chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum AdminDialogueState {
    #[default]
    Idle,
    /// Creating or editing a product
    ProductWizard(WizardContext),
    /// Waiting for a banner photo captioned with a page name
    AwaitingBanner,
}

impl AdminDialogueState {
    pub fn is_active(&self) -> bool {
        !matches!(self, AdminDialogueState::Idle)
    }
}

/// Type alias for the admin dialogue
pub type AdminDialogue = Dialogue<AdminDialogueState, InMemStorage<AdminDialogueState>>;

/// Wizard-wide commands that are checked before any field input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Cancel,
    Back,
}

/// Recognise `/cancel`, `/back` and their localized words (case-insensitive).
/// English words are always accepted.
pub fn parse_control_command(text: &str, language_code: Option<&str>) -> Option<ControlCommand> {
    let input = text.trim().to_lowercase();

    let matches_word = |command: &str, key: &str, english: &str| {
        input == format!("/{command}") || input == english || input == t_lang(key, language_code).to_lowercase()
    };

    if matches_word("cancel", "wizard-cancel-word", "cancel") {
        Some(ControlCommand::Cancel)
    } else if matches_word("back", "wizard-back-word", "back") {
        Some(ControlCommand::Back)
    } else {
        None
    }
}

/// `/start`, optionally addressed to the bot as `/start@name`
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

/// Validates the caption of a banner photo against the known page names
pub fn validate_banner_page(caption: Option<&str>, pages: &[String]) -> Result<String, &'static str> {
    let page = caption.map(str::trim).unwrap_or_default();

    if page.is_empty() {
        return Err("empty");
    }

    if !pages.iter().any(|p| p == page) {
        return Err("unknown_page");
    }

    Ok(page.to_string())
}
