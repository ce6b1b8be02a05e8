//! 好友监听器回调接口

use async_trait::async_trait;

/// 好友监听器回调接口：本地缓存按服务端快照重建后触发
#[async_trait]
pub trait FriendListener: Send + Sync {
    /// 好友列表发生变更，参数为新快照的 JSON 数组字符串
    async fn on_friend_list_changed(&self, friends_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyFriendListener;

#[async_trait]
impl FriendListener for EmptyFriendListener {
    async fn on_friend_list_changed(&self, _friends_json: String) {
        // 默认不做任何处理
    }
}
