//! # Callback Data Module
//!
//! Inline button payloads. Telegram carries them as strings of at most 64 bytes,
//! so each token is a short `:`-separated record with a fixed prefix.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MENU_PREFIX: &str = "menu";
const ADMIN_PREFIX: &str = "adm";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackDataError {
    #[error("Unknown callback prefix in '{0}'")]
    UnknownPrefix(String),
    #[error("Wrong number of fields in '{0}'")]
    FieldCount(String),
    #[error("Invalid {field} in '{raw}'")]
    InvalidField { field: &'static str, raw: String },
}

/// Navigation token for the user menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCallback {
    pub level: u8,
    /// Screen or action name: `main`, `catalog`, `cart`, `add_to_cart`, `delete`, ...
    pub menu_name: String,
    pub category: Option<i32>,
    pub page: usize,
    pub product_id: Option<i32>,
}

impl MenuCallback {
    pub fn new(level: u8, menu_name: impl Into<String>) -> Self {
        Self {
            level,
            menu_name: menu_name.into(),
            category: None,
            page: 1,
            product_id: None,
        }
    }

    pub fn category(mut self, category: i32) -> Self {
        self.category = Some(category);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn product(mut self, product_id: i32) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn is_menu_token(raw: &str) -> bool {
        raw.split(':').next() == Some(MENU_PREFIX)
    }
}

fn optional_field(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_optional(raw: &str, part: &str, field: &'static str) -> Result<Option<i32>, CallbackDataError> {
    if part.is_empty() {
        return Ok(None);
    }
    part.parse().map(Some).map_err(|_| CallbackDataError::InvalidField {
        field,
        raw: raw.to_string(),
    })
}

impl fmt::Display for MenuCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{MENU_PREFIX}:{}:{}:{}:{}:{}",
            self.level,
            self.menu_name,
            optional_field(self.category),
            self.page,
            optional_field(self.product_id)
        )
    }
}

impl FromStr for MenuCallback {
    type Err = CallbackDataError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [prefix, level, menu_name, category, page, product_id] = parts.as_slice() else {
            return Err(CallbackDataError::FieldCount(raw.to_string()));
        };

        if *prefix != MENU_PREFIX {
            return Err(CallbackDataError::UnknownPrefix(raw.to_string()));
        }

        let invalid = |field| CallbackDataError::InvalidField {
            field,
            raw: raw.to_string(),
        };

        Ok(Self {
            level: level.parse().map_err(|_| invalid("level"))?,
            menu_name: menu_name.to_string(),
            category: parse_optional(raw, category, "category")?,
            page: page.parse().map_err(|_| invalid("page"))?,
            product_id: parse_optional(raw, product_id, "product id")?,
        })
    }
}

/// Buttons of the admin assortment and of the wizard's category step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCallback {
    /// List the products of a category
    Category(i32),
    DeleteProduct(i32),
    EditProduct(i32),
    /// Category chosen during the product wizard
    PickCategory(i32),
}

impl fmt::Display for AdminCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminCallback::Category(id) => write!(f, "{ADMIN_PREFIX}:cat:{id}"),
            AdminCallback::DeleteProduct(id) => write!(f, "{ADMIN_PREFIX}:del:{id}"),
            AdminCallback::EditProduct(id) => write!(f, "{ADMIN_PREFIX}:edit:{id}"),
            AdminCallback::PickCategory(id) => write!(f, "{ADMIN_PREFIX}:pick:{id}"),
        }
    }
}

impl FromStr for AdminCallback {
    type Err = CallbackDataError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [prefix, action, id] = parts.as_slice() else {
            return Err(CallbackDataError::FieldCount(raw.to_string()));
        };

        if *prefix != ADMIN_PREFIX {
            return Err(CallbackDataError::UnknownPrefix(raw.to_string()));
        }

        let id: i32 = id.parse().map_err(|_| CallbackDataError::InvalidField {
            field: "id",
            raw: raw.to_string(),
        })?;

        match *action {
            "cat" => Ok(AdminCallback::Category(id)),
            "del" => Ok(AdminCallback::DeleteProduct(id)),
            "edit" => Ok(AdminCallback::EditProduct(id)),
            "pick" => Ok(AdminCallback::PickCategory(id)),
            _ => Err(CallbackDataError::InvalidField {
                field: "action",
                raw: raw.to_string(),
            }),
        }
    }
}
