//! 好友同步服务层
//!
//! 本地缓存与远端好友关系的唯一协调者：同一个逻辑操作里既调远端
//! 又动本地缓存的代码只允许出现在这里。远端是权威，本地缓存只是
//! 供 "是否已是好友" 判定用的只读镜像。

use crate::flipped::error::{FlippedError, Result};
use crate::flipped::friend::api::FriendApi;
use crate::flipped::friend::dao::{self, FriendDao};
use crate::flipped::friend::listener::{EmptyFriendListener, FriendListener};
use crate::flipped::friend::models::FriendSyncerConfig;
use crate::flipped::types::MutationResponse;
use std::sync::Arc;
use tracing::{debug, info};

/// 好友同步器
pub struct FriendSyncer {
    config: FriendSyncerConfig,
    /// 好友 API 客户端
    api: FriendApi,
    /// 好友本地缓存 DAO
    dao: FriendDao,
    /// 好友监听器
    listener: Arc<dyn FriendListener>,
}

impl FriendSyncer {
    /// 创建新的好友同步器（使用默认空监听器）
    pub async fn new(config: FriendSyncerConfig) -> Result<Self> {
        Self::with_listener(config, Arc::new(EmptyFriendListener)).await
    }

    /// 创建新的好友同步器（带自定义监听器）
    ///
    /// 绑定本地缓存库（幂等）、为当前用户建表，并用登录 token
    /// 构造带默认 `token` 请求头的 HTTP 客户端。
    pub async fn with_listener(
        config: FriendSyncerConfig,
        listener: Arc<dyn FriendListener>,
    ) -> Result<Self> {
        info!(
            "[FriendSync] 创建好友同步器，用户: {}, SQLite数据库: {}",
            config.username, config.db_path
        );

        dao::open(&config.db_path);

        let http_client = FriendApi::build_authed_client(&config.token)?;
        let api = FriendApi::new(http_client, config.api_base_url.clone());
        let dao = FriendDao::new(config.username.clone())?;
        dao.ensure_table().await?;

        Ok(Self {
            config,
            api,
            dao,
            listener,
        })
    }

    /// 全量刷新：拉取服务端好友快照并整表重建本地缓存
    ///
    /// 重建完成后用新快照触发监听器回调。返回快照本身。
    pub async fn refresh_friends(&self) -> Result<Vec<String>> {
        info!("[FriendSync] 🔄 开始全量刷新好友列表...");
        let snapshot = self.api.get_friend_list().await?;
        self.dao.replace_all(&snapshot).await?;

        // 字符串数组的序列化不会失败；真失败了也上抛而不是吞掉
        let json = serde_json::to_string(&snapshot)
            .map_err(|e| FlippedError::Protocol(format!("好友快照序列化失败: {}", e)))?;
        self.listener.on_friend_list_changed(json).await;

        info!(
            "[FriendSync] ✅ 全量刷新完成，用户 {} 好友数: {}",
            self.config.username,
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// 添加好友
    ///
    /// 先调远端 addFriend；只要拿到了响应（无论状态码），就紧跟一次
    /// 全量刷新，用服务端当前真值覆盖本地缓存——从而绕开部分失败时
    /// "本地该不该记" 的歧义。传输层彻底失败时直接上抛，不刷新。
    pub async fn add_friend(&self, friend_name: &str) -> Result<MutationResponse> {
        let resp = self.api.add_friend(friend_name).await?;
        self.refresh_friends().await?;
        Ok(resp)
    }

    /// 删除好友
    ///
    /// 调远端 deleteFriend 后只做本地单行删除，不做全量刷新
    /// （与添加好友的策略不对称，取舍记录在 DESIGN.md）。
    pub async fn remove_friend(&self, friend_name: &str) -> Result<MutationResponse> {
        let resp = self.api.delete_friend(friend_name).await?;
        self.dao.delete(friend_name).await?;
        debug!(
            "[FriendSync] 已从本地缓存删除好友: {} -> {}",
            self.config.username, friend_name
        );
        Ok(resp)
    }

    /// 候选人是否已经是当前用户的好友（只查本地缓存，不发请求）
    ///
    /// 其他会话刚做过远端变更时这里可能短暂读到旧值，属设计内。
    pub async fn is_already_friend(&self, candidate_name: &str) -> Result<bool> {
        self.dao.is_friend(candidate_name).await
    }

    /// 读取本地缓存里的好友列表
    pub async fn list_local_friends(&self) -> Result<Vec<String>> {
        self.dao.list_friends().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::Mutex;

    /// 在回环地址上起一个最小的 Flipped 服务端，返回 base URL
    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("绑定回环端口失败");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn friend_list_response(friends: &[&str]) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "message": "succeed to find friend list",
            "data": friends,
        }))
    }

    async fn syncer_for(username: &str, base_url: String) -> FriendSyncer {
        dao::open_test_store();
        FriendSyncer::new(FriendSyncerConfig {
            username: username.to_string(),
            api_base_url: base_url,
            token: "test-token".to_string(),
            db_path: "ignored-already-bound.db".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn add_friend_rejection_body_is_surfaced_and_cache_still_rebuilt() {
        // 服务端拒绝 addFriend（500 + 错误体），但 friendList 返回快照 S
        let app = Router::new()
            .route(
                "/addFriend",
                post(|| async {
                    (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"blocked"}"#)
                }),
            )
            .route(
                "/friendList",
                get(|| async { friend_list_response(&["bob", "carol"]) }),
            );
        let base_url = spawn_server(app).await;
        let syncer = syncer_for("svc_rejected", base_url).await;

        // 预置过期的本地缓存，验证整表重建
        syncer.dao.insert("stale").await.unwrap();

        let resp = syncer.add_friend("bob").await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body, r#"{"error":"blocked"}"#);
        assert!(!resp.is_success());

        let mut local = syncer.list_local_friends().await.unwrap();
        local.sort();
        assert_eq!(local, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[tokio::test]
    async fn add_friend_success_converges_to_server_snapshot() {
        let app = Router::new()
            .route("/addFriend", post(|| async { "succeed to handle the request" }))
            .route(
                "/friendList",
                get(|| async { friend_list_response(&["bob"]) }),
            );
        let base_url = spawn_server(app).await;
        let syncer = syncer_for("svc_converge", base_url).await;

        let resp = syncer.add_friend("bob").await.unwrap();
        assert!(resp.is_success());
        assert!(syncer.is_already_friend("bob").await.unwrap());
        assert_eq!(
            syncer.list_local_friends().await.unwrap(),
            vec!["bob".to_string()]
        );
    }

    #[tokio::test]
    async fn remove_friend_deletes_locally_without_a_refresh() {
        // 故意不挂 friendList 路由：若 remove_friend 触发了全量刷新会直接报错
        let app = Router::new()
            .route("/deleteFriend", post(|| async { "succeed to handle the request" }));
        let base_url = spawn_server(app).await;
        let syncer = syncer_for("svc_remove", base_url).await;

        syncer.dao.insert("bob").await.unwrap();
        syncer.dao.insert("carol").await.unwrap();

        let resp = syncer.remove_friend("bob").await.unwrap();
        assert!(resp.is_success());
        assert_eq!(
            syncer.list_local_friends().await.unwrap(),
            vec!["carol".to_string()]
        );
    }

    #[tokio::test]
    async fn refresh_fires_listener_with_new_snapshot() {
        struct RecordingListener {
            seen: Mutex<Option<String>>,
        }
        #[async_trait::async_trait]
        impl FriendListener for RecordingListener {
            async fn on_friend_list_changed(&self, friends_json: String) {
                *self.seen.lock().unwrap() = Some(friends_json);
            }
        }

        let app = Router::new().route(
            "/friendList",
            get(|| async { friend_list_response(&["bob"]) }),
        );
        let base_url = spawn_server(app).await;

        dao::open_test_store();
        let listener = Arc::new(RecordingListener {
            seen: Mutex::new(None),
        });
        let syncer = FriendSyncer::with_listener(
            FriendSyncerConfig {
                username: "svc_listener".to_string(),
                api_base_url: base_url,
                token: "test-token".to_string(),
                db_path: "ignored-already-bound.db".to_string(),
            },
            listener.clone(),
        )
        .await
        .unwrap();

        syncer.refresh_friends().await.unwrap();
        assert_eq!(
            listener.seen.lock().unwrap().as_deref(),
            Some(r#"["bob"]"#)
        );
    }

    #[tokio::test]
    async fn token_header_reaches_the_server() {
        // friendList 处理函数校验自定义 token 请求头
        // 显式写全路径：crate 自己的 Result 别名只有一个泛型参数
        async fn guarded(
            State(expected): State<&'static str>,
            headers: axum::http::HeaderMap,
        ) -> std::result::Result<Json<serde_json::Value>, StatusCode> {
            match headers.get("token").and_then(|v| v.to_str().ok()) {
                Some(t) if t == expected => Ok(Json(serde_json::json!({
                    "message": "succeed to find friend list",
                    "data": ["bob"],
                }))),
                _ => Err(StatusCode::UNAUTHORIZED),
            }
        }
        let app = Router::new()
            .route("/friendList", get(guarded))
            .with_state("test-token");
        let base_url = spawn_server(app).await;
        let syncer = syncer_for("svc_token", base_url).await;

        assert_eq!(
            syncer.refresh_friends().await.unwrap(),
            vec!["bob".to_string()]
        );
    }
}
