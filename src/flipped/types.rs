//! Flipped 服务端响应的公共结构与处理函数

use crate::flipped::error::{FlippedError, Result};
use serde::Deserialize;

/// 统一的 API 响应包装结构体（包含 code、message、data）
/// 服务端部分接口不回传 code 字段，data 也可能为 null、空字符串或缺失，
/// 因此 code 和 data 都按 Option 处理，serde 会把缺失或 null 反序列化为 None
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    pub data: Option<T>,
}

/// 变更类接口（addFriend / deleteFriend）的原始响应
///
/// 服务端会在非 2xx 的响应体里携带有意义的拒绝原因，
/// 所以无论状态码如何都把 body 原样带给调用方，由调用方决定如何解读。
#[derive(Debug, Clone)]
pub struct MutationResponse {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl MutationResponse {
    /// 服务端是否以 2xx 接受了这次变更
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// 通用 HTTP 响应处理函数：校验状态码后反序列化为统一的响应结构体
///
/// 返回 `ApiResponse<T>`，调用方根据需要处理 `data` 字段（可能为 None）。
/// 读取类接口（login / recommendUser / friendList）共用此方法；
/// 变更类接口需要保留非 2xx 的响应体，不走这里。
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<ApiResponse<T>> {
    use tracing::{debug, error, info};

    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.map_err(FlippedError::Network)?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    info!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        // 401/403 说明 token 被服务端拒绝
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FlippedError::Auth(format!(
                "token 被服务端拒绝 ({}): {}",
                status, body_str
            )));
        }
        return Err(FlippedError::Protocol(format!(
            "HTTP 错误 {}: {}",
            status, body_str
        )));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    // 从 bytes 反序列化（因为 body 已经被消费了）
    let api_resp: ApiResponse<T> = serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        FlippedError::Protocol(format!("反序列化响应失败: {:?}", e))
    })?;

    Ok(api_resp)
}
