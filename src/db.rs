//! # Database Module
//!
//! Schema bootstrap, entity rows and the generic record access layer. Every
//! function takes a `&mut PgConnection` so callers decide the unit of work:
//! handlers pass an open transaction and commit it once the interaction is done.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::errors::{StoreError, StoreResult};

/// Initialize the database schema
pub async fn init_database_schema(conn: &mut PgConnection) -> StoreResult<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS banners (
            id SERIAL PRIMARY KEY,
            name VARCHAR(15) NOT NULL UNIQUE,
            image VARCHAR(255),
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categories (
            id SERIAL PRIMARY KEY,
            name VARCHAR(150) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id SERIAL PRIMARY KEY,
            name VARCHAR(150) NOT NULL,
            description TEXT NOT NULL,
            price NUMERIC(5, 2) NOT NULL CHECK (price >= 0),
            image VARCHAR(255) NOT NULL,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            telegram_id BIGINT NOT NULL UNIQUE,
            first_name VARCHAR(150),
            last_name VARCHAR(150),
            phone VARCHAR(13),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS carts (
            id SERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(telegram_id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, product_id)
        )",
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category_id ON products(category_id)")
        .execute(&mut *conn)
        .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// A table whose rows can be loaded through the generic access functions
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
}

/// Info page banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Banner {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl Record for Banner {
    const TABLE: &'static str = "banners";
    const COLUMNS: &'static str = "id, name, image, description";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

impl Record for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static str = "id, name";
}

/// Catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Telegram file id of the product photo
    pub image: String,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static str =
        "id, name, description, price, image, category_id, created_at, updated_at";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub telegram_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, telegram_id, first_name, last_name, phone";
}

/// One (user, product) line of a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: i32,
    /// Telegram id of the owner
    pub user_id: i64,
    pub product_id: i32,
    pub quantity: i32,
}

impl Record for Cart {
    const TABLE: &'static str = "carts";
    const COLUMNS: &'static str = "id, user_id, product_id, quantity";
}

/// A cart line joined with the product it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CartProduct {
    pub product_id: i32,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl CartProduct {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Value side of an equality filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i32),
    BigInt(i64),
    Text(String),
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Int(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::BigInt(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

/// `column = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: FilterValue,
}

/// Build an equality filter
pub fn eq(column: &'static str, value: impl Into<FilterValue>) -> Filter {
    Filter {
        column,
        value: value.into(),
    }
}

fn select_query<T: Record>(filters: &[Filter]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", T::COLUMNS, T::TABLE));

    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(filter.column);
        builder.push(" = ");
        match &filter.value {
            FilterValue::Int(v) => builder.push_bind(*v),
            FilterValue::BigInt(v) => builder.push_bind(*v),
            FilterValue::Text(v) => builder.push_bind(v.clone()),
        };
    }

    builder.push(" ORDER BY id");
    builder
}

/// Fetch every row of `T` matching all filters
pub async fn get_all<T: Record>(conn: &mut PgConnection, filters: &[Filter]) -> StoreResult<Vec<T>> {
    debug!(table = T::TABLE, filters = filters.len(), "Fetching all rows");

    let rows = select_query::<T>(filters)
        .build_query_as::<T>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Fetch the single row matching the filters.
///
/// The filters are expected to identify at most one row; a second match is
/// reported as [`StoreError::MultipleRows`] rather than silently picking one.
pub async fn get_one<T: Record>(conn: &mut PgConnection, filters: &[Filter]) -> StoreResult<Option<T>> {
    let mut builder = select_query::<T>(filters);
    builder.push(" LIMIT 2");

    let mut rows = builder.build_query_as::<T>().fetch_all(&mut *conn).await?;

    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        _ => Err(StoreError::MultipleRows { table: T::TABLE }),
    }
}

/// Fetch any one row of `T`; used to check whether a table has been seeded
pub async fn get_first<T: Record>(conn: &mut PgConnection) -> StoreResult<Option<T>> {
    let mut builder = select_query::<T>(&[]);
    builder.push(" LIMIT 1");

    let row = builder
        .build_query_as::<T>()
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row)
}
