//! 好友 HTTP API 客户端
//!
//! 负责所有好友相关的 HTTP 请求：推荐、全量列表、添加、删除。
//! token 由外部在构造 `reqwest::Client` 时放进默认请求头（自定义 `token` 头）。

use crate::flipped::error::{FlippedError, Result};
use crate::flipped::friend::models::Candidate;
use crate::flipped::types::{handle_http_response, ApiResponse, MutationResponse};
use tracing::{debug, error, info};
use uuid::Uuid;

/// 好友相关的 HTTP API 客户端
#[derive(Clone)]
pub struct FriendApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl FriendApi {
    /// 创建新的好友 API 客户端
    ///
    /// `client` 应该已经在外部配置好 token 默认请求头
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 用登录 token 构造带默认 `token` 请求头的 HTTP 客户端
    pub fn build_authed_client(token: &str) -> Result<reqwest::Client> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::HeaderName::from_static("token"),
            reqwest::header::HeaderValue::from_str(token)
                .map_err(|_| FlippedError::Auth("token 含有非法字符".to_string()))?,
        );
        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .map_err(FlippedError::Network)?;
        Ok(client)
    }

    /// 从服务器获取一位推荐候选人
    ///
    /// 返回服务端的提示信息和解码后的候选人资料；data 缺失或字段不全
    /// 都是协议错误。
    pub async fn get_recommendation(&self) -> Result<(String, Candidate)> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/recommendUser", self.api_base_url);

        info!("[FriendAPI] 📡 请求推荐候选人");
        debug!("[FriendAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FlippedError::Network)?;

        let api_resp: ApiResponse<Candidate> =
            handle_http_response(response, "推荐候选人").await?;

        let candidate = api_resp.data.ok_or_else(|| {
            error!("[FriendAPI] 推荐候选人响应中缺少 data 字段");
            FlippedError::Protocol("响应中缺少 data 字段".to_string())
        })?;

        info!(
            "[FriendAPI] ✅ 收到推荐候选人: {} ({})",
            candidate.username, candidate.real_name
        );
        Ok((api_resp.message, candidate))
    }

    /// 从服务器获取全量好友用户名列表（重建本地缓存时的权威读取）
    pub async fn get_friend_list(&self) -> Result<Vec<String>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/friendList", self.api_base_url);

        info!("[FriendAPI] 📡 请求全量好友列表");
        debug!("[FriendAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FlippedError::Network)?;

        let api_resp: ApiResponse<Vec<String>> =
            handle_http_response(response, "全量好友列表").await?;

        let friends = api_resp.data.ok_or_else(|| {
            error!("[FriendAPI] 全量好友列表响应中缺少 data 字段");
            FlippedError::Protocol("响应中缺少 data 字段".to_string())
        })?;

        info!("[FriendAPI] ✅ 全量好友列表响应，好友数: {}", friends.len());
        Ok(friends)
    }

    /// 添加好友：POST，好友名放在 `friend` 查询参数里
    ///
    /// 无论状态码如何都读出响应体交给调用方——服务端会在非 2xx
    /// 的响应体里携带拒绝原因。完全拿不到响应时才是 `Network`。
    pub async fn add_friend(&self, friend_name: &str) -> Result<MutationResponse> {
        self.mutate("addFriend", "添加好友", friend_name).await
    }

    /// 删除好友：与添加好友相同的响应体保留纪律
    pub async fn delete_friend(&self, friend_name: &str) -> Result<MutationResponse> {
        self.mutate("deleteFriend", "删除好友", friend_name).await
    }

    async fn mutate(
        &self,
        endpoint: &str,
        operation_name: &str,
        friend_name: &str,
    ) -> Result<MutationResponse> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/{}", self.api_base_url, endpoint);

        info!("[FriendAPI] 📡 {}: {}", operation_name, friend_name);
        debug!("[FriendAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .query(&[("friend", friend_name)])
            .send()
            .await
            .map_err(|e| {
                error!("[FriendAPI] {}传输失败: {:?}", operation_name, e);
                FlippedError::Network(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(FlippedError::Network)?;

        if status.is_success() {
            info!("[FriendAPI] ✅ {}响应 ({}): {}", operation_name, status, body);
        } else {
            error!(
                "[FriendAPI] {}被服务端拒绝 ({}): {}",
                operation_name, status, body
            );
        }

        Ok(MutationResponse { status, body })
    }
}
