pub mod error;
pub mod feishu;
pub mod http_client;

pub use error::{RemoteError, Result};
pub use feishu::{BitableApi, FeishuClient, IssuedToken, Record};
