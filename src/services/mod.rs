//! Domain services, one module per entity, built on the record access layer in
//! [`crate::db`].

pub mod banner;
pub mod cart;
pub mod category;
pub mod product;
pub mod user;

pub use product::{NewProduct, ProductChanges};
