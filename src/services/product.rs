//! Catalog item operations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;

use crate::db::{eq, get_all, get_one, Product};
use crate::errors::{StoreError, StoreResult};
use crate::wizard::{SubmitTarget, Submission};

/// Fields of a product about to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category_id: i32,
}

/// Fields to overwrite on an existing product; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Option<i32>,
}

impl ProductChanges {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
    }
}

impl From<NewProduct> for ProductChanges {
    fn from(product: NewProduct) -> Self {
        Self {
            name: Some(product.name),
            description: Some(product.description),
            price: Some(product.price),
            image: Some(product.image),
            category_id: Some(product.category_id),
        }
    }
}

pub async fn add_product(conn: &mut PgConnection, product: &NewProduct) -> StoreResult<Product> {
    let created = sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, description, price, image, category_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, name, description, price, image, category_id, created_at, updated_at",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.image)
    .bind(product.category_id)
    .fetch_one(&mut *conn)
    .await?;

    info!(product_id = created.id, category_id = created.category_id, "Product created");
    Ok(created)
}

pub async fn get_all_products(conn: &mut PgConnection, category_id: i32) -> StoreResult<Vec<Product>> {
    get_all(conn, &[eq("category_id", category_id)]).await
}

pub async fn get_one_product(conn: &mut PgConnection, product_id: i32) -> StoreResult<Option<Product>> {
    get_one(conn, &[eq("id", product_id)]).await
}

/// Overwrite the supplied fields of a product
pub async fn update_product(
    conn: &mut PgConnection,
    product_id: i32,
    changes: &ProductChanges,
) -> StoreResult<Product> {
    let mut product = get_one_product(conn, product_id)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", product_id))?;

    changes.apply_to(&mut product);

    let updated = sqlx::query_as::<_, Product>(
        "UPDATE products
         SET name = $1, description = $2, price = $3, image = $4, category_id = $5, updated_at = NOW()
         WHERE id = $6
         RETURNING id, name, description, price, image, category_id, created_at, updated_at",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.image)
    .bind(product.category_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    info!(product_id, "Product updated");
    Ok(updated)
}

pub async fn delete_product(conn: &mut PgConnection, product_id: i32) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("Product", product_id));
    }

    info!(product_id, "Product deleted");
    Ok(())
}

/// Write a finished wizard: insert for a new product, overwrite for an edit
pub async fn persist_submission(conn: &mut PgConnection, submission: &Submission) -> StoreResult<Product> {
    match submission.target {
        SubmitTarget::Create => add_product(conn, &submission.product).await,
        SubmitTarget::Update(product_id) => {
            let changes = ProductChanges::from(submission.product.clone());
            update_product(conn, product_id, &changes).await
        }
    }
}
