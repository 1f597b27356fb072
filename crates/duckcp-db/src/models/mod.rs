pub mod credential;
pub mod projection;
pub mod repository;
pub mod snapshot;
pub mod task;
pub mod transformer;

pub use credential::{Credential, NewCredential};
pub use projection::*;
pub use repository::{NewRepository, NewStorage, Repository, Storage};
pub use snapshot::{NewSnapshot, Snapshot};
pub use task::{NewTask, NewTaskTransformer, Task, TaskTransformer};
pub use transformer::{NewTransformer, Transformer};

/// Current time in the catalog's timestamp format (`YYYY-MM-DD HH:MM:SS`, UTC).
pub fn timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}

pub fn format_timestamp(time: chrono::DateTime<chrono::Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}
