//! # Product Wizard Module
//!
//! The multi-step form admins use to create or edit a catalog item. The wizard
//! is a pure state machine: a [`WizardContext`] plus one [`WizardInput`] yields a
//! [`Transition`]. Persisting the result, prompting and keyboards are left to
//! the Telegram bindings in `bot::dialogue_manager`.
//!
//! Steps run `Name -> Description -> Category -> Price -> Image`. In edit mode
//! the [`SKIP_SENTINEL`] keeps the stored value of the field; in create mode
//! there is nothing to keep, so the sentinel is rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::db::Product;
use crate::services::NewProduct;

/// Names must be strictly shorter than this many characters
pub const MAX_NAME_CHARS: usize = 100;
/// Input meaning "keep the current value"
pub const SKIP_SENTINEL: &str = ".";
/// Largest price `NUMERIC(5, 2)` can hold
pub const MAX_PRICE: Decimal = Decimal::from_parts(99_999, 0, 0, false, 2);

/// One input field of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Name,
    Description,
    Category,
    Price,
    Image,
}

impl Step {
    pub const FIRST: Step = Step::Name;

    /// Step that `back` returns to
    pub fn predecessor(self) -> Option<Step> {
        match self {
            Step::Name => None,
            Step::Description => Some(Step::Name),
            Step::Category => Some(Step::Description),
            Step::Price => Some(Step::Category),
            Step::Image => Some(Step::Price),
        }
    }

    /// Step entered after valid input; `None` means the form is complete
    pub fn successor(self) -> Option<Step> {
        match self {
            Step::Name => Some(Step::Description),
            Step::Description => Some(Step::Category),
            Step::Category => Some(Step::Price),
            Step::Price => Some(Step::Image),
            Step::Image => None,
        }
    }
}

/// Whether the wizard creates a new product or edits a loaded one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WizardMode {
    Create,
    /// Snapshot of the product under edit; skip sentinels resolve against it
    Edit(Product),
}

/// Values collected so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl ProductDraft {
    fn first_missing(&self) -> Option<Step> {
        if self.name.is_none() {
            Some(Step::Name)
        } else if self.description.is_none() {
            Some(Step::Description)
        } else if self.category_id.is_none() {
            Some(Step::Category)
        } else if self.price.is_none() {
            Some(Step::Price)
        } else if self.image.is_none() {
            Some(Step::Image)
        } else {
            None
        }
    }

    fn into_new_product(self) -> Option<NewProduct> {
        Some(NewProduct {
            name: self.name?,
            description: self.description?,
            category_id: self.category_id?,
            price: self.price?,
            image: self.image?,
        })
    }
}

/// Per-conversation wizard state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardContext {
    pub mode: WizardMode,
    pub step: Step,
    pub draft: ProductDraft,
}

/// One event fed to the wizard
#[derive(Debug, Clone, PartialEq)]
pub enum WizardInput {
    Text(String),
    /// Telegram file id of the largest photo size
    Photo(String),
    /// Category id taken from a category button
    CategorySelected(i32),
    Back,
    Cancel,
    /// Anything else: stickers, documents, foreign callbacks
    Unsupported,
}

/// Why an input did not advance the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NameTooLong,
    InvalidPrice,
    PriceOutOfRange,
    UnknownCategory,
    /// The skip sentinel outside edit mode
    SkipNotAllowed,
    /// `back` on the first step
    NoPreviousStep,
    /// Wrong kind of input for the step
    UnexpectedInput(Step),
    /// A field the final step depends on was never filled
    MissingField(Step),
}

/// What the final step produced
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitTarget {
    Create,
    Update(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub target: SubmitTarget,
    pub product: NewProduct,
}

/// Result of feeding one input to the wizard
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved forward; prompt for `context.step`
    Advanced(WizardContext),
    /// Moved back; re-issue the prompt for `context.step`
    SteppedBack(WizardContext),
    /// Stayed (or was retargeted to a missing field); tell the admin why
    Rejected(WizardContext, Rejection),
    /// All collected data dropped; the conversation is idle again
    Cancelled,
    /// Form complete; the conversation is idle again
    Completed(Submission),
}

/// Parse a price the way the form accepts it: a plain or scientific decimal,
/// non-negative, at most [`MAX_PRICE`], rounded to cents.
pub fn parse_price(input: &str) -> Result<Decimal, Rejection> {
    let trimmed = input.trim();
    let price = match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
        Ok(price) => price,
        Err(_) => parse_unbounded_price(trimmed)?,
    }
    .round_dp(2);

    if price.is_sign_negative() && !price.is_zero() {
        return Err(Rejection::PriceOutOfRange);
    }
    if price > MAX_PRICE {
        return Err(Rejection::PriceOutOfRange);
    }

    Ok(price)
}

/// Exponents a `Decimal` cannot hold: magnitudes under a cent become zero,
/// everything else too large for a price is out of range
fn parse_unbounded_price(input: &str) -> Result<Decimal, Rejection> {
    let value = input.parse::<f64>().map_err(|_| Rejection::InvalidPrice)?;
    if value.is_nan() {
        return Err(Rejection::InvalidPrice);
    }
    if value.abs() < 0.005 {
        return Ok(Decimal::ZERO);
    }
    Decimal::try_from(value).map_err(|_| Rejection::PriceOutOfRange)
}

/// Validate a product name
pub fn validate_name(name: &str) -> Result<String, Rejection> {
    let trimmed = name.trim();
    // Bot commands are never product names
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return Err(Rejection::UnexpectedInput(Step::Name));
    }
    if name.chars().count() >= MAX_NAME_CHARS {
        return Err(Rejection::NameTooLong);
    }
    Ok(name.to_string())
}

impl WizardContext {
    pub fn create() -> Self {
        Self {
            mode: WizardMode::Create,
            step: Step::FIRST,
            draft: ProductDraft::default(),
        }
    }

    pub fn edit(product: Product) -> Self {
        Self {
            mode: WizardMode::Edit(product),
            step: Step::FIRST,
            draft: ProductDraft::default(),
        }
    }

    pub fn editing(&self) -> Option<&Product> {
        match &self.mode {
            WizardMode::Edit(product) => Some(product),
            WizardMode::Create => None,
        }
    }

    /// Feed one input. `category_ids` are the categories currently in the store;
    /// they are only consulted on the category step.
    pub fn handle(self, input: WizardInput, category_ids: &[i32]) -> Transition {
        match input {
            WizardInput::Cancel => Transition::Cancelled,
            WizardInput::Back => self.back(),
            WizardInput::Text(text) if text == SKIP_SENTINEL => self.skip(),
            input => self.fill(input, category_ids),
        }
    }

    fn back(mut self) -> Transition {
        match self.step.predecessor() {
            Some(previous) => {
                self.step = previous;
                Transition::SteppedBack(self)
            }
            None => Transition::Rejected(self, Rejection::NoPreviousStep),
        }
    }

    fn skip(mut self) -> Transition {
        let Some(product) = self.editing().cloned() else {
            return Transition::Rejected(self, Rejection::SkipNotAllowed);
        };

        match self.step {
            Step::Name => self.draft.name = Some(product.name),
            Step::Description => self.draft.description = Some(product.description),
            Step::Category => self.draft.category_id = Some(product.category_id),
            Step::Price => self.draft.price = Some(product.price),
            Step::Image => self.draft.image = Some(product.image),
        }

        self.advance()
    }

    fn fill(mut self, input: WizardInput, category_ids: &[i32]) -> Transition {
        let step = self.step;
        let outcome = match (step, input) {
            (Step::Name, WizardInput::Text(text)) => validate_name(&text).map(|name| {
                self.draft.name = Some(name);
            }),
            (Step::Description, WizardInput::Text(text)) if !text.trim().is_empty() => {
                self.draft.description = Some(text);
                Ok(())
            }
            (Step::Category, WizardInput::CategorySelected(id)) => {
                if category_ids.contains(&id) {
                    self.draft.category_id = Some(id);
                    Ok(())
                } else {
                    Err(Rejection::UnknownCategory)
                }
            }
            (Step::Price, WizardInput::Text(text)) => parse_price(&text).map(|price| {
                self.draft.price = Some(price);
            }),
            (Step::Image, WizardInput::Photo(file_id)) => {
                self.draft.image = Some(file_id);
                Ok(())
            }
            (step, _) => Err(Rejection::UnexpectedInput(step)),
        };

        match outcome {
            Ok(()) => self.advance(),
            Err(rejection) => Transition::Rejected(self, rejection),
        }
    }

    fn advance(mut self) -> Transition {
        if let Some(next) = self.step.successor() {
            self.step = next;
            return Transition::Advanced(self);
        }

        if let Some(missing) = self.draft.first_missing() {
            self.step = missing;
            return Transition::Rejected(self, Rejection::MissingField(missing));
        }

        let target = match &self.mode {
            WizardMode::Create => SubmitTarget::Create,
            WizardMode::Edit(product) => SubmitTarget::Update(product.id),
        };

        match self.draft.clone().into_new_product() {
            Some(product) => Transition::Completed(Submission { target, product }),
            None => Transition::Rejected(self, Rejection::MissingField(Step::FIRST)),
        }
    }
}
