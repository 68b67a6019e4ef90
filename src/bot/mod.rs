//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles commands, admin keyboard buttons and dialogue input
//! - `callback_handler`: Handles menu and admin inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats captions
//! - `dialogue_manager`: Drives the product wizard and the banner upload

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::dialogue::AdminDialogueState;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Update routing: every update enters the per-chat dialogue, then goes to
/// the message or callback endpoint.
///
/// Expects `Arc<PgPool>`, `Arc<BotConfig>` and `InMemStorage<AdminDialogueState>`
/// among the dispatcher dependencies.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dialogue::enter::<Update, InMemStorage<AdminDialogueState>, AdminDialogueState, _>()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
