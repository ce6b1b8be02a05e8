//! SDK 统一错误类型
//!
//! 按失败来源划分：网络传输、协议（响应结构不符）、认证、本地缓存库未打开、
//! 本地文件 IO、SQLite 执行失败。除了文档约定的两个幂等空操作
//! （重复插入、删除不存在的行）之外，所有失败都以类型化错误上抛，不做重试。

use thiserror::Error;

/// Flipped SDK 错误
#[derive(Debug, Error)]
pub enum FlippedError {
    /// 传输层失败，完全拿不到响应
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),

    /// 收到了响应但 JSON 结构与预期不符（字段缺失、大小写不匹配等）
    #[error("协议错误: {0}")]
    Protocol(String),

    /// 登录被拒绝，或需要 token 的调用没有 token
    #[error("认证失败: {0}")]
    Auth(String),

    /// 本地缓存库尚未打开就执行了缓存操作
    #[error("本地缓存库尚未打开")]
    NotConnected,

    /// 本地文件不可读（例如注册时的头像文件）
    #[error("本地文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite 执行失败
    #[error("本地数据库错误: {0}")]
    Database(#[from] sqlx::Error),
}

/// 本 crate 统一的 Result 别名
pub type Result<T> = std::result::Result<T, FlippedError>;
