//! 好友模块
//!
//! 远端好友 API、本地缓存 DAO 与两者之间的同步器

pub mod api;
pub mod dao;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::FriendApi;
pub use dao::FriendDao;
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::{Candidate, FriendSyncerConfig};
pub use service::FriendSyncer;
