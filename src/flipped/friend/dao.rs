//! 好友本地缓存数据访问层（DAO）
//!
//! 单个 SQLite 文件作为本地缓存，每个登录用户一张表，每行一个好友用户名。
//! 整个进程只绑定第一次 `open` 见到的路径，之后的 `open` 一律是空操作。
//! 每个操作自己打开连接、执行、关闭，不跨调用持有长连接。

use crate::flipped::error::{FlippedError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Row};
use std::sync::OnceLock;
use tracing::{debug, info};

static DB_PATH: OnceLock<String> = OnceLock::new();

/// 打开（绑定）本地缓存数据库
///
/// 幂等：重复打开同一路径、或在已绑定后传入新路径，都是空操作——
/// 进程生命周期内只存在一个缓存文件。
pub fn open(path: &str) {
    match DB_PATH.set(path.to_string()) {
        Ok(()) => info!("[FriendDAO] 📁 本地缓存数据库已绑定: {}", path),
        Err(_) => debug!(
            "[FriendDAO] 本地缓存数据库已绑定为 {}，忽略新路径 {}",
            DB_PATH.get().map(String::as_str).unwrap_or(""),
            path
        ),
    }
}

/// 把用户名安全地转成 SQLite 表名（双引号包裹，内部引号翻倍）
fn table_ident(username: &str) -> String {
    format!("\"{}\"", username.replace('"', "\"\""))
}

/// 好友本地缓存 DAO（基于 sqlx，按操作开关连接）
pub struct FriendDao {
    username: String,
    db_path: String,
}

impl FriendDao {
    /// 创建某个用户的好友缓存 DAO
    ///
    /// 缓存库尚未 `open` 时返回 `NotConnected`。
    pub fn new(username: String) -> Result<Self> {
        let db_path = DB_PATH.get().ok_or(FlippedError::NotConnected)?.clone();
        Ok(Self { username, db_path })
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        let opts = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true);
        let conn = SqliteConnection::connect_with(&opts).await?;
        Ok(conn)
    }

    /// 为当前用户建表（不存在时）
    pub async fn ensure_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (friend TEXT PRIMARY KEY)",
            table_ident(&self.username)
        );
        let mut conn = self.connect().await?;
        sqlx::query(&sql).execute(&mut conn).await?;
        conn.close().await?;
        debug!("[FriendDAO] 用户 {} 的好友表就绪", self.username);
        Ok(())
    }

    /// 插入一个好友用户名；已存在时静默忽略（幂等）
    pub async fn insert(&self, friend_name: &str) -> Result<()> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (friend) VALUES (?)",
            table_ident(&self.username)
        );
        let mut conn = self.connect().await?;
        let result = sqlx::query(&sql).bind(friend_name).execute(&mut conn).await?;
        conn.close().await?;
        debug!(
            "[FriendDAO] 插入好友 {} -> {}，影响 {} 行",
            self.username,
            friend_name,
            result.rows_affected()
        );
        Ok(())
    }

    /// 全量读取当前用户的本地好友列表
    pub async fn list_friends(&self) -> Result<Vec<String>> {
        let sql = format!("SELECT friend FROM {}", table_ident(&self.username));
        let mut conn = self.connect().await?;
        let rows = sqlx::query(&sql).fetch_all(&mut conn).await?;
        conn.close().await?;
        let friends = rows
            .into_iter()
            .map(|row| row.get::<String, _>("friend"))
            .collect::<Vec<_>>();
        debug!(
            "[FriendDAO] 用户 {} 本地好友共 {} 个",
            self.username,
            friends.len()
        );
        Ok(friends)
    }

    /// 成员判定：候选人是否已经是当前用户的好友（基于全量读取）
    pub async fn is_friend(&self, candidate_name: &str) -> Result<bool> {
        let friends = self.list_friends().await?;
        Ok(friends.iter().any(|f| f == candidate_name))
    }

    /// 删除一个好友用户名；不存在时静默忽略（幂等）
    pub async fn delete(&self, friend_name: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE friend = ?",
            table_ident(&self.username)
        );
        let mut conn = self.connect().await?;
        let result = sqlx::query(&sql).bind(friend_name).execute(&mut conn).await?;
        conn.close().await?;
        debug!(
            "[FriendDAO] 删除好友 {} -> {}，影响 {} 行",
            self.username,
            friend_name,
            result.rows_affected()
        );
        Ok(())
    }

    /// 用服务端快照整表重建：先清空再逐条插入
    ///
    /// 整个重建在单个事务里完成，中途失败时回滚，不会留下写到一半的表。
    pub async fn replace_all(&self, friends: &[String]) -> Result<()> {
        let delete_sql = format!("DELETE FROM {}", table_ident(&self.username));
        let insert_sql = format!(
            "INSERT OR IGNORE INTO {} (friend) VALUES (?)",
            table_ident(&self.username)
        );
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;
        sqlx::query(&delete_sql).execute(&mut *tx).await?;
        for friend in friends {
            sqlx::query(&insert_sql).bind(friend).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        conn.close().await?;
        info!(
            "[FriendDAO] 用户 {} 的好友表已按服务端快照重建，共 {} 个",
            self.username,
            friends.len()
        );
        Ok(())
    }
}

/// 测试共享的缓存库绑定：整个测试进程只绑定一次临时文件
#[cfg(test)]
pub(crate) fn open_test_store() {
    static DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    let dir = DIR.get_or_init(|| tempfile::tempdir().expect("创建临时目录失败"));
    let path = dir.path().join("friend_cache.db");
    open(path.to_str().expect("临时路径非 UTF-8"));
}
