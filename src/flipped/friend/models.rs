//! 好友模块本地模型定义

use crate::flipped::error::{FlippedError, Result};
use base64::Engine;
use serde::Deserialize;

/// 推荐候选人资料（recommendUser 接口的 data 对象）
///
/// 字段名与服务端 JSON 严格一一对应（大小写敏感），任何字段缺失都按
/// 协议错误处理，而不是静默填默认值。构造后不可变，UI 取下一位时丢弃。
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "RealName")]
    pub real_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Profession")]
    pub profession: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Hobby")]
    pub hobby: String,
    /// 头像图片，base64 文本编码
    #[serde(rename = "Photo")]
    pub photo: String,
    /// 账号类型枚举值（0、1、...）
    #[serde(rename = "UserType")]
    pub user_type: i32,
}

impl Candidate {
    /// 把 base64 编码的头像字段解码成原始图片字节
    pub fn decode_photo(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.photo.as_bytes())
            .map_err(|e| FlippedError::Protocol(format!("头像 base64 解码失败: {}", e)))
    }
}

/// 好友同步器配置
pub struct FriendSyncerConfig {
    /// 当前登录用户名（也是本地缓存表名）
    pub username: String,
    /// API 基础 URL
    pub api_base_url: String,
    /// 登录签发的 token
    pub token: String,
    /// 本地缓存数据库路径（SQLite 单文件）
    pub db_path: String,
}
