//! Catalog access, one struct of static functions per table.
//!
//! - [`Repositories`] - repository CRUD and listing
//! - [`Storages`] - storages within a repository
//! - [`Transformers`] - migration definitions
//! - [`Tasks`] and [`TaskTransformers`] - ordered transformer sequences
//! - [`Snapshots`] - diff-sync state
//! - [`Credentials`] - cached access tokens

pub mod credentials;
pub mod repositories;
pub mod snapshots;
pub mod storages;
pub mod tasks;
pub mod transformers;

pub use credentials::Credentials;
pub use repositories::Repositories;
pub use snapshots::Snapshots;
pub use storages::Storages;
pub use tasks::{TaskTransformers, Tasks};
pub use transformers::Transformers;
