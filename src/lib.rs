//! # Storefront Telegram Bot
//!
//! A Telegram shop: customers browse a paginated catalog and manage a cart
//! through inline menus, while admins maintain products and banners through
//! a step-by-step wizard. Data lives in PostgreSQL.

pub mod bot;
pub mod callback_data;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod menu;
pub mod paginator;
pub mod seed;
pub mod services;
pub mod wizard;
