pub mod adapter;
pub mod context;
pub mod credential;
pub mod error;
pub mod executor;
pub mod kind;
pub mod properties;
pub mod sql;
pub mod transform;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use context::DuckcpContext;
pub use error::{DuckcpError, DuckcpResult, ErrorContext};
pub use kind::RepositoryKind;
pub use value::{Dataset, Value};
