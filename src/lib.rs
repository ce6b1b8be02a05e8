pub mod flipped;

// 重新导出常用类型和函数，方便外部使用
pub use flipped::{
    client::{ClientConfig, FlippedClient},
    error::{FlippedError, Result},
    friend::{Candidate, FriendSyncer, FriendSyncerConfig},
    login_async, register_async, Session,
};
