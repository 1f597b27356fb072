//! Operations behind the duckcp command line.
//!
//! Every operation takes a [`DuckcpContext`], validates its input, and then reads or writes the
//! catalog. Nothing here prints; callers render the returned values.

pub mod meta;
pub mod repository;
pub mod storage;
pub mod task;
pub mod transformer;
pub mod types;
mod utils;

#[cfg(test)]
mod testing;

pub use duckcp_core::DuckcpContext;
pub use types::*;
