//! HTTP API 服务器
//!
//! 提供图片资源的静态访问，以及批量写入、列举和清理接口。

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use indexmap::IndexMap;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::asset_store::paths::CATALOG_FILE_NAME;
use crate::asset_store::SessionAssetStore;
use crate::config::AppConfig;

/// 服务共享状态
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionAssetStore>,
    /// 未指定时的过期清理阈值（天）
    pub max_age_days: u32,
}

/// 批量写入请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    /// 原始 ID -> Base64 / data URI
    pub images: IndexMap<String, String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// 过期清理请求
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    #[serde(default)]
    pub max_age_days: Option<u32>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({"error": {"message": message.into()}})),
    )
        .into_response()
}

/// 存储操作都是阻塞的文件系统调用，放到阻塞线程池执行
async fn run_blocking<T, F>(store: &Arc<SessionAssetStore>, f: F) -> Result<T, Response>
where
    F: FnOnce(&SessionAssetStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| {
            tracing::error!("[Server] 存储任务执行失败: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage task failed")
        })
}

/// 静态资源只暴露图片文件，会话信息和隐藏文件（包括写入中的临时文件）一律 404
async fn hide_private_files(request: Request, next: Next) -> Response {
    let private = request.uri().path().split('/').any(|segment| {
        let segment = urlencoding::decode(segment)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        segment.starts_with('.') || segment == CATALOG_FILE_NAME
    });
    if private {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// 构建路由
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let assets = ServiceBuilder::new()
        .layer(middleware::from_fn(hide_private_files))
        .service(ServeDir::new(state.store.base_dir()));
    let prefix = state.store.public_prefix().trim_end_matches('/').to_string();

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/assets", post(ingest_assets))
        .route(
            "/api/assets/:session_id",
            get(list_assets).delete(delete_session),
        )
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/cleanup", post(cleanup_sessions));

    let app = if prefix.is_empty() {
        app.fallback_service(assets)
    } else {
        app.nest_service(&prefix, assets)
    };

    app.layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动服务器，`shutdown` 完成后优雅退出
pub async fn run_server<S>(config: AppConfig, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let store = SessionAssetStore::with_base_dir(config.storage.root_path())
        .with_context(|| format!("初始化存储目录失败: {}", config.storage.root))?
        .with_public_prefix(config.storage.public_prefix.clone());
    tracing::info!(
        "[Server] 资源目录: {:?}，访问前缀: {}",
        store.base_dir(),
        store.public_prefix()
    );

    let store = Arc::new(store);
    let max_age_days = config.storage.max_age_days;

    let removed = run_blocking(&store, move |s| s.cleanup_expired(max_age_days))
        .await
        .unwrap_or(0);
    if removed > 0 {
        tracing::info!("[Server] 启动时清理过期会话 {} 个", removed);
    }

    let state = AppState {
        store,
        max_age_days,
    };
    let app = build_router(state, config.server.max_body_bytes);

    let addr: std::net::SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("无效的监听地址")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("绑定端口失败: {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn ingest_assets(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Response {
    let result = run_blocking(&state.store, move |store| {
        store.ingest(request.images, request.session_id.as_deref())
    })
    .await;

    match result {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(e)) if e.is_invalid_id() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Ok(Err(e)) => {
            tracing::error!("[Server] 写入图片失败: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(response) => response,
    }
}

async fn list_assets(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    match run_blocking(&state.store, move |store| store.list_assets(&session_id)).await {
        Ok(assets) => Json(assets).into_response(),
        Err(response) => response,
    }
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match run_blocking(&state.store, move |store| store.delete_session(&session_id)).await {
        Ok(deleted) => Json(serde_json::json!({"deleted": deleted})).into_response(),
        Err(response) => response,
    }
}

async fn list_sessions(State(state): State<AppState>) -> Response {
    match run_blocking(&state.store, |store| store.list_sessions()).await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(response) => response,
    }
}

async fn cleanup_sessions(
    State(state): State<AppState>,
    body: Option<Json<CleanupRequest>>,
) -> Response {
    let max_age_days = body
        .and_then(|Json(req)| req.max_age_days)
        .unwrap_or(state.max_age_days);

    match run_blocking(&state.store, move |store| store.cleanup_expired(max_age_days)).await {
        Ok(removed) => Json(serde_json::json!({"removed": removed})).into_response(),
        Err(response) => response,
    }
}
