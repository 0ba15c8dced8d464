use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ghostchat_gateway::{GatewayState, Registry, registry::Context, router};
use ghostchat_platform::{ChannelLogExporter, RestPlatform};
use ghostchat_relay::{ChatroomManager, LifecycleBus};
use ghostchat_types::events::LifecycleEvent;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghostchat=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = env_or("GHOSTCHAT_DB_PATH", "ghostchat.db");
    let host = env_or("GHOSTCHAT_HOST", "0.0.0.0");
    let port: u16 = env_or("GHOSTCHAT_PORT", "3000").parse()?;
    let api_base = env_or("GHOSTCHAT_API_BASE", "https://discord.com/api/v10");
    let token = std::env::var("GHOSTCHAT_BOT_TOKEN")
        .map_err(|_| anyhow::anyhow!("GHOSTCHAT_BOT_TOKEN must be set"))?;
    let guild_id = std::env::var("GHOSTCHAT_GUILD_ID")
        .map_err(|_| anyhow::anyhow!("GHOSTCHAT_GUILD_ID must be set"))?;
    let category_id = std::env::var("GHOSTCHAT_CATEGORY_ID")
        .map_err(|_| anyhow::anyhow!("GHOSTCHAT_CATEGORY_ID must be set"))?;
    let archive_category_id = std::env::var("GHOSTCHAT_ARCHIVE_CATEGORY_ID").ok();

    // Init database
    let db = Arc::new(ghostchat_db::Database::open(&PathBuf::from(&db_path))?);

    // Platform client + manager
    let platform = Arc::new(RestPlatform::new(api_base, token)?);
    let exporter = Arc::new(ChannelLogExporter::new(platform.clone()));
    let events = LifecycleBus::new();
    let manager = Arc::new(ChatroomManager::new(
        db,
        platform.clone(),
        platform,
        exporter,
        events.clone(),
        archive_category_id,
    ));

    // Audit-log consumer of lifecycle events
    let mut lifecycle = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle.recv().await {
            match event {
                LifecycleEvent::ChatroomCreate { room_id, creator_username, creator_id, .. } => {
                    info!("audit: chatroom {room_id} created by {creator_username} ({creator_id})");
                }
                LifecycleEvent::ChatroomClose { room_id, participants, notified, .. } => {
                    info!("audit: chatroom {room_id} closed, {notified}/{participants} notified");
                }
            }
        }
    });

    // Interaction surface
    let state = GatewayState {
        ctx: Arc::new(Context { manager, guild_id, category_id }),
        registry: Arc::new(Registry::standard()),
    };
    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Ghost Chat relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
