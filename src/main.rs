use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ocrchat_lib::config::{default_config_path, load_config, AppConfig};
use ocrchat_lib::server::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 第一个参数为配置文件路径
    let config_path: Option<PathBuf> = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(default_config_path);

    let config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => AppConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ocrchat={0},ocrchat_lib={0},tower_http=warn",
            config.logging.level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run_server(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("监听退出信号失败: {}", e);
        }
        tracing::info!("Shutting down");
    })
    .await
}
