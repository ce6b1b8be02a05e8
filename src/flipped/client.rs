//! Flipped 客户端：对 UI 协作方暴露的统一入口
//!
//! 持有会话状态（登录前为 None），把登录、注册、推荐、好友增删和
//! 本地成员判定露出为一组操作。UI 只负责收集表单输入和渲染返回值，
//! 业务逻辑全部在这一层之下。

use crate::flipped::auth::{login_async, register_async, RegisterResponse, Session};
use crate::flipped::error::{FlippedError, Result};
use crate::flipped::friend::api::FriendApi;
use crate::flipped::friend::models::{Candidate, FriendSyncerConfig};
use crate::flipped::friend::service::FriendSyncer;
use crate::flipped::types::MutationResponse;
use std::collections::HashMap;
use tracing::info;

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API 基础 URL，例如 `http://39.99.190.67:8081`
    pub api_base_url: String,
    /// 本地好友缓存数据库路径（SQLite 单文件）
    pub db_path: String,
}

impl ClientConfig {
    pub fn new(api_base_url: String, db_path: String) -> Self {
        Self {
            api_base_url,
            db_path,
        }
    }
}

/// Flipped 客户端
///
/// 进程启动时未认证；一次成功登录之后进入已认证状态并一直保持到
/// 进程退出（协议里没有登出操作）。
pub struct FlippedClient {
    config: ClientConfig,
    session: Option<Session>,
    api: Option<FriendApi>,
    syncer: Option<FriendSyncer>,
}

impl FlippedClient {
    /// 创建未认证的客户端
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
            api: None,
            syncer: None,
        }
    }

    /// 当前会话（登录成功前为 None）
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn require_api(&self) -> Result<&FriendApi> {
        // 未登录时不发出任何请求，直接快速失败
        self.api
            .as_ref()
            .ok_or_else(|| FlippedError::Auth("尚未登录，没有可用的 token".to_string()))
    }

    fn require_syncer(&self) -> Result<&FriendSyncer> {
        self.syncer
            .as_ref()
            .ok_or_else(|| FlippedError::Auth("尚未登录，没有可用的 token".to_string()))
    }

    /// 登录并初始化好友同步器，返回服务端的提示信息
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String> {
        let login_info = login_async(&self.config.api_base_url, username, password).await?;

        let session = Session::new(
            username.to_string(),
            password.to_string(),
            login_info.token.clone(),
        );

        let http_client = FriendApi::build_authed_client(&session.token)?;
        let api = FriendApi::new(http_client, self.config.api_base_url.clone());
        let syncer = FriendSyncer::new(FriendSyncerConfig {
            username: session.username.clone(),
            api_base_url: self.config.api_base_url.clone(),
            token: session.token.clone(),
            db_path: self.config.db_path.clone(),
        })
        .await?;

        info!("[Client] ✅ 用户 {} 登录完成，好友同步器就绪", username);
        self.session = Some(session);
        self.api = Some(api);
        self.syncer = Some(syncer);
        Ok(login_info.message)
    }

    /// 注册新账号：不需要认证
    ///
    /// `fields` 是除头像外的全部表单字段，`avatar_path` 是头像文件路径。
    pub async fn register(
        &self,
        fields: &HashMap<String, String>,
        avatar_path: &str,
    ) -> Result<RegisterResponse> {
        register_async(&self.config.api_base_url, fields, avatar_path).await
    }

    /// 获取一位推荐候选人；未登录时不发请求，直接返回认证错误
    pub async fn get_recommendation(&self) -> Result<(String, Candidate)> {
        self.require_api()?.get_recommendation().await
    }

    /// 候选人是否已经是当前用户的好友（只查本地缓存）
    pub async fn is_already_friend(&self, candidate_name: &str) -> Result<bool> {
        self.require_syncer()?.is_already_friend(candidate_name).await
    }

    /// 添加好友（远端变更 + 全量刷新本地缓存）
    pub async fn add_friend(&self, friend_name: &str) -> Result<MutationResponse> {
        self.require_syncer()?.add_friend(friend_name).await
    }

    /// 删除好友（远端变更 + 本地单行删除）
    pub async fn remove_friend(&self, friend_name: &str) -> Result<MutationResponse> {
        self.require_syncer()?.remove_friend(friend_name).await
    }

    /// 读取本地缓存的好友列表
    pub async fn list_local_friends(&self) -> Result<Vec<String>> {
        self.require_syncer()?.list_local_friends().await
    }

    /// 手动触发一次全量刷新（例如登录后预热本地缓存）
    pub async fn refresh_friends(&self) -> Result<Vec<String>> {
        self.require_syncer()?.refresh_friends().await
    }
}
