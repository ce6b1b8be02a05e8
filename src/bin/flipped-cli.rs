//! Flipped CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示 SDK 核心功能：
//! 登录、刷新并打印好友列表、拉取一位推荐候选人，可选地添加/删除好友

use anyhow::Result;
use clap::Parser;
use flipped_sdk_core_rust::{ClientConfig, FlippedClient};
use tracing::{error, info};

/// Flipped CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "flipped-cli")]
#[command(about = "Flipped CLI 客户端 - 用于测试和展示好友管理功能", long_about = None)]
struct Args {
    /// 服务端基础 URL
    #[arg(short, long, default_value = "http://39.99.190.67:8081")]
    server: String,

    /// 登录用户名
    #[arg(short, long)]
    username: String,

    /// 登录口令
    #[arg(short, long)]
    password: String,

    /// 本地好友缓存数据库路径
    #[arg(long, default_value = "friendList.db")]
    db: String,

    /// 登录后添加该好友
    #[arg(long)]
    add: Option<String>,

    /// 登录后删除该好友
    #[arg(long)]
    remove: Option<String>,

    /// 日志级别（默认: info,flipped_sdk_core_rust=debug）
    #[arg(long, default_value = "info,flipped_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level);

    info!("[CLI] 🚀 Flipped CLI 客户端（测试模式）");
    info!("[CLI] 🌐 服务端: {}", args.server);
    info!("[CLI] 👤 用户名: {}", args.username);

    let mut client = FlippedClient::new(ClientConfig::new(args.server.clone(), args.db.clone()));

    // 登录
    info!("[CLI] 🔐 正在登录...");
    let message = client
        .login(&args.username, &args.password)
        .await
        .map_err(|e| anyhow::anyhow!("登录失败: {}", e))?;
    info!("[CLI] ✅ 登录成功: {}", message);

    // 登录后先预热本地缓存
    let friends = client.refresh_friends().await?;
    info!("[CLI] 👥 好友列表（共 {} 个）:", friends.len());
    for friend in friends.iter() {
        info!("[CLI]   - {}", friend);
    }

    // 可选：添加好友
    if let Some(name) = args.add.as_deref() {
        if client.is_already_friend(name).await? {
            info!("[CLI] ⏭️  {} 已经是好友，跳过添加", name);
        } else {
            let resp = client.add_friend(name).await?;
            if resp.is_success() {
                info!("[CLI] ✅ 添加好友 {} 成功: {}", name, resp.body);
            } else {
                error!(
                    "[CLI] ❌ 添加好友 {} 被拒绝 ({}): {}",
                    name, resp.status, resp.body
                );
            }
        }
    }

    // 可选：删除好友
    if let Some(name) = args.remove.as_deref() {
        if client.is_already_friend(name).await? {
            let resp = client.remove_friend(name).await?;
            if resp.is_success() {
                info!("[CLI] ✅ 删除好友 {} 成功: {}", name, resp.body);
            } else {
                error!(
                    "[CLI] ❌ 删除好友 {} 被拒绝 ({}): {}",
                    name, resp.status, resp.body
                );
            }
        } else {
            info!("[CLI] ⏭️  {} 不在本地好友缓存里，跳过删除", name);
        }
    }

    // 拉取一位推荐候选人
    match client.get_recommendation().await {
        Ok((msg, candidate)) => {
            info!("[CLI] 💘 推荐候选人 ({}):", msg);
            info!(
                "[CLI]   {} | {} | {} 岁 | {} | {} | {}",
                candidate.username,
                candidate.real_name,
                candidate.age,
                candidate.profession,
                candidate.region,
                candidate.hobby
            );
            match candidate.decode_photo() {
                Ok(photo) => info!("[CLI]   头像 {} 字节", photo.len()),
                Err(e) => error!("[CLI]   头像解码失败: {}", e),
            }
        }
        Err(e) => error!("[CLI] ❌ 获取推荐候选人失败: {}", e),
    }

    info!("[CLI] 👋 完成");
    Ok(())
}
