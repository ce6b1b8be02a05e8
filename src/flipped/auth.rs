//! 账号相关的 HTTP 调用：登录与注册
//!
//! 登录凭证以 URL 查询参数提交（服务端约定），token 从响应包装结构的
//! data.token 字段取出，之后所有需要认证的调用都带上它。

use crate::flipped::error::{FlippedError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 已认证会话：登录成功后才会构造，进程退出前一直有效（没有登出操作）
#[derive(Debug, Clone)]
pub struct Session {
    /// 登录用户名
    pub username: String,
    /// 登录口令（仅作占位保留，不会再次发送）
    pub credential: String,
    /// 服务端签发的 token，后续请求放在自定义 `token` 请求头里
    pub token: String,
}

impl Session {
    pub fn new(username: String, credential: String, token: String) -> Self {
        Self {
            username,
            credential,
            token,
        }
    }
}

/// 登录成功的结果：服务端的提示信息和签发的 token
#[derive(Debug, Clone)]
pub struct LoginInfo {
    pub message: String,
    pub token: String,
}

/// 登录响应包装结构：登录被拒绝时服务端把 data 回成空字符串而不是
/// 对象，所以 data 按任意 JSON 值接收，token 在拿到后再从里面取
#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// 注册接口的原始响应：状态码加响应体
///
/// 原始协议没有结构化的成败标志，调用方统一用 `is_success()` 判断，
/// 不再比较状态字符串。
#[derive(Debug, Clone)]
pub struct RegisterResponse {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl RegisterResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// 登录：POST 到 `{base}/login`，凭证放在 URL 查询参数里，请求体为空
///
/// 传输层失败返回 `Network`；响应包装结构缺失或不完整（拿不到 token）
/// 一律视为登录被拒绝，返回 `Auth`。不做重试。
pub async fn login_async(api_base_url: &str, username: &str, password: &str) -> Result<LoginInfo> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/login", api_base_url);

    info!("[Auth] 🔐 正在登录...");
    debug!("[Auth]   URL: {}", url);
    debug!("[Auth]   用户名: {}, 操作ID: {}", username, operation_id);

    let response = client
        .post(&url)
        .query(&[("username", username), ("password", password)])
        .send()
        .await
        .map_err(FlippedError::Network)?;

    let status = response.status();
    let text = response.text().await.map_err(FlippedError::Network)?;
    debug!("[Auth] 登录响应 ({}): {}", status, text);

    let envelope: LoginEnvelope = serde_json::from_str(&text).map_err(|e| {
        error!("[Auth] 登录响应解析失败: {:?}，原始响应: {}", e, text);
        FlippedError::Auth(format!("登录响应不是预期的包装结构: {}", text))
    })?;

    let token = match envelope.data.get("token").and_then(|t| t.as_str()) {
        Some(token) => token.to_string(),
        None => {
            error!("[Auth] 登录被拒绝: {}", envelope.message);
            return Err(FlippedError::Auth(envelope.message));
        }
    };

    info!("[Auth] ✅ 登录成功: {}", envelope.message);
    Ok(LoginInfo {
        message: envelope.message,
        token,
    })
}

/// 注册：multipart POST 到 `{base}/register`
///
/// 除头像外的所有表单字段放在 URL 查询参数里，头像文件作为名为 `photo`
/// 的二进制分片上传。头像文件不可读返回 `Io`，传输失败返回 `Network`。
pub async fn register_async(
    api_base_url: &str,
    fields: &HashMap<String, String>,
    avatar_path: &str,
) -> Result<RegisterResponse> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/register", api_base_url);

    info!("[Auth] 📝 正在注册...");
    debug!("[Auth]   URL: {}", url);
    debug!("[Auth]   操作ID: {}, 头像: {}", operation_id, avatar_path);

    let avatar_bytes = tokio::fs::read(avatar_path).await.map_err(|e| {
        error!("[Auth] 头像文件读取失败: {}: {}", avatar_path, e);
        FlippedError::Io(e)
    })?;
    let file_name = Path::new(avatar_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "avatar".to_string());

    let form = reqwest::multipart::Form::new().part(
        "photo",
        reqwest::multipart::Part::bytes(avatar_bytes).file_name(file_name),
    );

    let query: Vec<(&str, &str)> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let response = client
        .post(&url)
        .query(&query)
        .multipart(form)
        .send()
        .await
        .map_err(FlippedError::Network)?;

    let status = response.status();
    let body = response.text().await.map_err(FlippedError::Network)?;
    info!("[Auth] 注册响应 ({}): {}", status, body);

    Ok(RegisterResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

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

    fn register_fields() -> HashMap<String, String> {
        HashMap::from([
            ("name".to_string(), "bob".to_string()),
            ("password".to_string(), "pw1".to_string()),
            ("email".to_string(), "bob@example.com".to_string()),
            ("user_type".to_string(), "1".to_string()),
        ])
    }

    #[tokio::test]
    async fn unreadable_avatar_is_an_io_error() {
        // 文件在发请求之前读取，所以服务端地址根本不会被访问
        let result = register_async(
            "http://127.0.0.1:1",
            &register_fields(),
            "/definitely/not/there/avatar.png",
        )
        .await;
        assert!(matches!(result, Err(FlippedError::Io(_))));
    }

    #[tokio::test]
    async fn register_sends_photo_part_and_query_fields() {
        // 服务端校验注册请求的线上形态：表单字段在 URL 查询参数里，
        // 头像作为名为 photo 的 multipart 分片，文件名和内容原样到达
        async fn register_handler(
            Query(params): Query<HashMap<String, String>>,
            headers: axum::http::HeaderMap,
            body: axum::body::Bytes,
        ) -> (StatusCode, &'static str) {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            let body_str = String::from_utf8_lossy(&body);
            let ok = content_type.starts_with("multipart/form-data")
                && params.get("name").map(String::as_str) == Some("bob")
                && params.get("password").map(String::as_str) == Some("pw1")
                && params.get("email").map(String::as_str) == Some("bob@example.com")
                && params.get("user_type").map(String::as_str) == Some("1")
                && !params.contains_key("avatarSource")
                && body_str.contains("name=\"photo\"")
                && body_str.contains("filename=\"avatar.png\"")
                && body_str.contains("fake-image-bytes");
            if ok {
                (StatusCode::OK, "Register Successfully!")
            } else {
                (StatusCode::BAD_REQUEST, "unexpected register request shape")
            }
        }
        let app = Router::new().route("/register", post(register_handler));
        let base_url = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let avatar_path = dir.path().join("avatar.png");
        std::fs::write(&avatar_path, b"fake-image-bytes").unwrap();

        let resp = register_async(
            &base_url,
            &register_fields(),
            avatar_path.to_str().unwrap(),
        )
        .await
        .unwrap();

        assert!(resp.is_success());
        assert_eq!(resp.body, "Register Successfully!");
    }

    #[tokio::test]
    async fn rejected_register_surfaces_status_and_body() {
        let app = Router::new().route(
            "/register",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Get an error when insert into DataBase",
                )
            }),
        );
        let base_url = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let avatar_path = dir.path().join("avatar.png");
        std::fs::write(&avatar_path, b"fake-image-bytes").unwrap();

        let resp = register_async(
            &base_url,
            &register_fields(),
            avatar_path.to_str().unwrap(),
        )
        .await
        .unwrap();

        assert!(!resp.is_success());
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body, "Get an error when insert into DataBase");
    }
}
