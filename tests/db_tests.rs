use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, PgConnection};
use std::env;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use storefront_bot::bot::dialogue_manager::{save_banner_image, save_submission};
use storefront_bot::callback_data::MenuCallback;
use storefront_bot::db::{eq, get_one, init_database_schema, Product};
use storefront_bot::dialogue::{AdminDialogue, AdminDialogueState};
use storefront_bot::errors::StoreError;
use storefront_bot::menu::get_menu_content;
use storefront_bot::seed::{seed_defaults, DEFAULT_BANNERS, DEFAULT_CATEGORIES};
use storefront_bot::services::{banner, cart, category, product, user, NewProduct, ProductChanges};
use storefront_bot::wizard::{Submission, Transition, WizardContext, WizardInput};

/// Helper macro to skip tests when database is not available.
/// Each test runs in its own schema so tests can run in parallel.
macro_rules! skip_if_no_db {
    ($test_fn:expr, $schema:expr) => {
        match setup_test_db($schema).await {
            Ok(mut conn) => {
                let result = $test_fn(&mut conn).await;
                teardown_test_db(&mut conn, $schema).await?;
                result
            }
            Err(_) => {
                eprintln!("Skipping test: Database not available");
                Ok(())
            }
        }
    };
}

async fn setup_test_db(schema: &str) -> Result<PgConnection> {
    // Skip tests if no DATABASE_URL is provided
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping database tests: DATABASE_URL not set");
            return Err(anyhow::anyhow!("Test database not configured"));
        }
    };

    let mut conn = PgConnection::connect(&database_url)
        .await
        .context("Failed to connect to test database")?;

    // Start every test from an empty schema
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&mut conn)
        .await?;
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&mut conn)
        .await?;
    sqlx::query(&format!("SET search_path TO {schema}"))
        .execute(&mut conn)
        .await?;

    init_database_schema(&mut conn).await?;
    seed_defaults(&mut conn).await?;

    Ok(conn)
}

async fn teardown_test_db(conn: &mut PgConnection, schema: &str) -> Result<()> {
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// A pool whose connections all work inside `schema`
async fn schema_pool(schema: &'static str) -> Result<PgPool> {
    let database_url = env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET search_path TO {schema}"))
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&database_url)
        .await?;
    Ok(pool)
}

/// A bot whose requests always fail: nothing listens on the discard port
fn unreachable_bot() -> Result<Bot> {
    let url = reqwest::Url::parse("http://127.0.0.1:9/")?;
    Ok(Bot::new("0:unreachable").set_api_url(url))
}

/// Drive the wizard through every step with valid inputs
fn run_wizard(mut context: WizardContext, inputs: Vec<WizardInput>, categories: &[i32]) -> Submission {
    let last = inputs.len() - 1;
    for (index, input) in inputs.into_iter().enumerate() {
        match context.handle(input, categories) {
            Transition::Advanced(next) if index < last => context = next,
            Transition::Completed(submission) if index == last => return submission,
            other => panic!("unexpected transition at input {index}: {other:?}"),
        }
    }
    unreachable!("the wizard never completed")
}

fn text(value: &str) -> WizardInput {
    WizardInput::Text(value.to_string())
}

async fn first_category(conn: &mut PgConnection) -> Result<i32> {
    let ids = category::get_category_ids(conn).await?;
    ids.first().copied().context("No categories seeded")
}

async fn create_product(conn: &mut PgConnection, name: &str, price: Decimal) -> Result<Product> {
    let category_id = first_category(conn).await?;
    let created = product::add_product(
        conn,
        &NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            image: format!("{name}-photo"),
            category_id,
        },
    )
    .await?;
    Ok(created)
}

#[tokio::test]
async fn test_seed_runs_once() -> Result<()> {
    skip_if_no_db!(test_seed_runs_once_impl, "test_seed_runs_once")
}

async fn test_seed_runs_once_impl(conn: &mut PgConnection) -> Result<()> {
    // setup_test_db already seeded once
    seed_defaults(conn).await?;

    let categories = category::get_categories(conn).await?;
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    assert_eq!(categories[0].name, "Food");

    let pages = banner::get_info_pages(conn).await?;
    assert_eq!(pages.len(), DEFAULT_BANNERS.len());
    assert!(pages.iter().all(|page| page.image.is_none()));

    Ok(())
}

#[tokio::test]
async fn test_cart_quantities() -> Result<()> {
    skip_if_no_db!(test_cart_quantities_impl, "test_cart_quantities")
}

async fn test_cart_quantities_impl(conn: &mut PgConnection) -> Result<()> {
    let pizza = create_product(conn, "Margherita", Decimal::new(999, 2)).await?;
    user::add_user(conn, 555, Some("Ann"), None, None).await?;

    for _ in 0..3 {
        cart::add_to_cart(conn, 555, pizza.id).await?;
    }

    let lines = cart::get_user_carts(conn, 555).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
    assert_eq!(lines[0].line_total(), Decimal::new(2997, 2));

    assert!(cart::reduce_product_in_cart(conn, 555, pizza.id).await?);
    assert!(cart::reduce_product_in_cart(conn, 555, pizza.id).await?);
    // Quantity 1: the line is removed
    assert!(!cart::reduce_product_in_cart(conn, 555, pizza.id).await?);
    assert!(cart::get_user_carts(conn, 555).await?.is_empty());

    // Absent line
    assert!(!cart::reduce_product_in_cart(conn, 555, pizza.id).await?);

    cart::add_to_cart(conn, 555, pizza.id).await?;
    cart::delete_from_cart(conn, 555, pizza.id).await?;
    cart::delete_from_cart(conn, 555, pizza.id).await?;
    assert!(cart::get_user_carts(conn, 555).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_user_registration_is_idempotent() -> Result<()> {
    skip_if_no_db!(test_user_registration_is_idempotent_impl, "test_user_registration")
}

async fn test_user_registration_is_idempotent_impl(conn: &mut PgConnection) -> Result<()> {
    let first = user::add_user(conn, 777, Some("Ann"), Some("Lee"), None).await?;
    let second = user::add_user(conn, 777, Some("Changed"), None, None).await?;

    assert_eq!(first, second);
    assert_eq!(second.first_name.as_deref(), Some("Ann"));
    assert_eq!(user::get_user(conn, 777).await?, Some(first));

    Ok(())
}

#[tokio::test]
async fn test_product_update_and_missing_rows() -> Result<()> {
    skip_if_no_db!(test_product_update_and_missing_rows_impl, "test_product_update")
}

async fn test_product_update_and_missing_rows_impl(conn: &mut PgConnection) -> Result<()> {
    let pizza = create_product(conn, "Margherita", Decimal::new(999, 2)).await?;

    let changes = ProductChanges {
        price: Some(Decimal::new(1250, 2)),
        ..Default::default()
    };
    let updated = product::update_product(conn, pizza.id, &changes).await?;
    assert_eq!(updated.price, Decimal::new(1250, 2));
    assert_eq!(updated.name, pizza.name);

    let missing = product::update_product(conn, 9999, &changes).await;
    assert!(matches!(missing, Err(ref e) if e.is_not_found()));

    product::delete_product(conn, pizza.id).await?;
    let deleted_again = product::delete_product(conn, pizza.id).await;
    assert!(matches!(deleted_again, Err(StoreError::NotFound { .. })));
    assert_eq!(product::get_one_product(conn, pizza.id).await?, None);

    let banner_missing = banner::change_banner_image(conn, "nowhere", "photo").await;
    assert!(matches!(banner_missing, Err(ref e) if e.is_not_found()));

    Ok(())
}

#[tokio::test]
async fn test_get_one_rejects_multiple_rows() -> Result<()> {
    skip_if_no_db!(test_get_one_rejects_multiple_rows_impl, "test_get_one_multiple")
}

async fn test_get_one_rejects_multiple_rows_impl(conn: &mut PgConnection) -> Result<()> {
    let pizza = create_product(conn, "Margherita", Decimal::new(999, 2)).await?;
    create_product(conn, "Pepperoni", Decimal::new(1199, 2)).await?;

    let result = get_one::<Product>(conn, &[eq("category_id", pizza.category_id)]).await;
    assert!(matches!(result, Err(StoreError::MultipleRows { .. })));

    let single = get_one::<Product>(conn, &[eq("name", "Pepperoni")]).await?;
    assert_eq!(single.map(|p| p.price), Some(Decimal::new(1199, 2)));

    Ok(())
}

#[tokio::test]
async fn test_cart_menu_delete_steps_back() -> Result<()> {
    skip_if_no_db!(test_cart_menu_delete_steps_back_impl, "test_cart_menu_delete")
}

async fn test_cart_menu_delete_steps_back_impl(conn: &mut PgConnection) -> Result<()> {
    let pizza = create_product(conn, "Margherita", Decimal::new(999, 2)).await?;
    let soda = create_product(conn, "Soda", Decimal::new(150, 2)).await?;
    user::add_user(conn, 42, None, None, None).await?;
    cart::add_to_cart(conn, 42, pizza.id).await?;
    cart::add_to_cart(conn, 42, soda.id).await?;

    // Deleting the line shown on page 2 shows page 1
    let callback = MenuCallback::new(3, "delete").page(2).product(soda.id);
    let content = get_menu_content(conn, &callback, Some(42), Some("en")).await?;
    assert_eq!(content.image.as_deref(), Some("Margherita-photo"));
    assert!(content.caption.contains("Margherita"));
    assert!(content.caption.contains("Item 1 of 1"));

    // Removing the last unit empties the cart
    let callback = MenuCallback::new(3, "decrement").page(1).product(pizza.id);
    let content = get_menu_content(conn, &callback, Some(42), Some("en")).await?;
    assert_eq!(content.caption, "<strong>Your cart is empty!</strong>");
    assert_eq!(content.keyboard.inline_keyboard.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_product_menu_pages() -> Result<()> {
    skip_if_no_db!(test_product_menu_pages_impl, "test_product_menu_pages")
}

async fn test_product_menu_pages_impl(conn: &mut PgConnection) -> Result<()> {
    let categories = category::get_category_ids(conn).await?;
    let empty_category = categories[1];

    let content = get_menu_content(
        conn,
        &MenuCallback::new(2, "category").category(empty_category),
        None,
        Some("en"),
    )
    .await?;
    assert!(content.caption.contains("no products"));

    create_product(conn, "Margherita", Decimal::new(999, 2)).await?;
    create_product(conn, "Pepperoni", Decimal::new(1199, 2)).await?;

    // Out of range pages are clamped to the last page
    let callback = MenuCallback::new(2, "next").category(categories[0]).page(9);
    let content = get_menu_content(conn, &callback, None, Some("en")).await?;
    assert_eq!(content.image.as_deref(), Some("Pepperoni-photo"));
    assert!(content.caption.contains("Product 2 of 2"));

    Ok(())
}

#[tokio::test]
async fn test_wizard_create_flow_is_persisted() -> Result<()> {
    skip_if_no_db!(test_wizard_create_flow_is_persisted_impl, "test_wizard_create_flow")
}

async fn test_wizard_create_flow_is_persisted_impl(conn: &mut PgConnection) -> Result<()> {
    let categories = category::get_category_ids(conn).await?;
    let drinks = categories[1];

    let submission = run_wizard(
        WizardContext::create(),
        vec![
            text("Margherita"),
            text("Tomato, mozzarella, basil"),
            WizardInput::CategorySelected(drinks),
            text("9.99"),
            WizardInput::Photo("file-abc".to_string()),
        ],
        &categories,
    );

    let saved = product::persist_submission(conn, &submission).await?;
    let stored = product::get_one_product(conn, saved.id)
        .await?
        .context("Saved product not found")?;

    assert_eq!(stored.name, "Margherita");
    assert_eq!(stored.description, "Tomato, mozzarella, basil");
    assert_eq!(stored.price, Decimal::new(999, 2));
    assert_eq!(stored.image, "file-abc");
    assert_eq!(stored.category_id, drinks);
    assert_eq!(product::get_all_products(conn, drinks).await?.len(), 1);
    assert!(product::get_all_products(conn, categories[0]).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_wizard_edit_of_deleted_product() -> Result<()> {
    skip_if_no_db!(test_wizard_edit_of_deleted_product_impl, "test_wizard_edit_deleted")
}

async fn test_wizard_edit_of_deleted_product_impl(conn: &mut PgConnection) -> Result<()> {
    let categories = category::get_category_ids(conn).await?;
    let pizza = create_product(conn, "Margherita", Decimal::new(999, 2)).await?;

    let context = WizardContext::edit(pizza.clone());
    product::delete_product(conn, pizza.id).await?;

    let submission = run_wizard(
        context,
        vec![text("."), text("."), text("."), text("12.50"), text(".")],
        &categories,
    );

    let result = product::persist_submission(conn, &submission).await;
    assert!(matches!(result, Err(ref e) if e.is_not_found()), "{result:?}");
    assert_eq!(product::get_one_product(conn, pizza.id).await?, None);

    Ok(())
}

const REPLY_FAILS_SCHEMA: &str = "test_wizard_reply_fails";

#[tokio::test]
async fn test_saved_wizard_is_closed_when_reply_fails() -> Result<()> {
    skip_if_no_db!(test_saved_wizard_is_closed_when_reply_fails_impl, REPLY_FAILS_SCHEMA)
}

async fn test_saved_wizard_is_closed_when_reply_fails_impl(conn: &mut PgConnection) -> Result<()> {
    let pool = schema_pool(REPLY_FAILS_SCHEMA).await?;
    let categories = category::get_category_ids(conn).await?;
    let chat_id = ChatId(1001);

    let inputs = vec![
        text("Margherita"),
        text("Classic"),
        WizardInput::CategorySelected(categories[0]),
        text("9.99"),
        WizardInput::Photo("file-abc".to_string()),
    ];
    let submission = run_wizard(WizardContext::create(), inputs, &categories);

    let dialogue = AdminDialogue::new(InMemStorage::<AdminDialogueState>::new(), chat_id);
    dialogue
        .update(AdminDialogueState::ProductWizard(WizardContext::create()))
        .await?;

    let bot = unreachable_bot()?;
    let result = save_submission(&bot, chat_id, dialogue.clone(), &pool, submission, Some("en")).await;

    // The confirmation could not be sent, but the product is stored once and
    // the wizard is gone, so a repeated photo cannot save it again
    assert!(result.is_err());
    assert_eq!(dialogue.get().await?, None);
    assert_eq!(product::get_all_products(conn, categories[0]).await?.len(), 1);

    pool.close().await;
    Ok(())
}

const BANNER_REPLY_FAILS_SCHEMA: &str = "test_banner_reply_fails";

#[tokio::test]
async fn test_banner_upload_is_closed_when_reply_fails() -> Result<()> {
    skip_if_no_db!(test_banner_upload_is_closed_when_reply_fails_impl, BANNER_REPLY_FAILS_SCHEMA)
}

async fn test_banner_upload_is_closed_when_reply_fails_impl(conn: &mut PgConnection) -> Result<()> {
    let pool = schema_pool(BANNER_REPLY_FAILS_SCHEMA).await?;
    let chat_id = ChatId(1002);

    let dialogue = AdminDialogue::new(InMemStorage::<AdminDialogueState>::new(), chat_id);
    dialogue.update(AdminDialogueState::AwaitingBanner).await?;

    let bot = unreachable_bot()?;
    let result = save_banner_image(&bot, chat_id, dialogue.clone(), &pool, "about", "about-photo", None).await;

    assert!(result.is_err());
    assert_eq!(dialogue.get().await?, None);
    let about = banner::get_banner(conn, "about").await?.context("Seeded banner missing")?;
    assert_eq!(about.image.as_deref(), Some("about-photo"));

    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn test_add_to_cart_of_deleted_product_fails_cleanly() -> Result<()> {
    skip_if_no_db!(test_add_to_cart_of_deleted_product_impl, "test_cart_deleted_product")
}

async fn test_add_to_cart_of_deleted_product_impl(conn: &mut PgConnection) -> Result<()> {
    let pizza = create_product(conn, "Margherita", Decimal::new(999, 2)).await?;
    user::add_user(conn, 555, Some("Ann"), None, None).await?;
    product::delete_product(conn, pizza.id).await?;

    let result = cart::add_to_cart(conn, 555, pizza.id).await;
    assert!(matches!(result, Err(StoreError::Database(_))), "{result:?}");
    assert!(cart::get_user_carts(conn, 555).await?.is_empty());

    Ok(())
}
