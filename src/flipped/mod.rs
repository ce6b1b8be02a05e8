pub mod auth;
pub mod client;
pub mod error;
pub mod friend;
pub mod types;

// 重新导出认证相关函数
pub use auth::{login_async, register_async, Session};

// 重新导出错误类型
pub use error::{FlippedError, Result};
