pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{CatalogConnection, CatalogStore};
pub use error::{DbError, Result};
