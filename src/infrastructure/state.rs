//! Shared application state

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::application::dispatch::Dispatcher;
use crate::application::ports::outbound::{DungeonRepositoryPort, WorldPort};
use crate::application::services::{
    ActorContext, DungeonServiceImpl, EditingSession, EditorSettings, ObjectLockService,
};
use crate::domain::value_objects::{LocationId, UserId, Vec3};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::SqliteDungeonStore;
use crate::infrastructure::session::SessionManager;
use crate::infrastructure::world::InMemoryWorld;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SqliteDungeonStore>,
    pub world: Arc<InMemoryWorld>,
    /// Object locks shared by every editing session
    pub locks: Arc<ObjectLockService>,
    pub dispatcher: Dispatcher,
    /// Bound websocket connections
    pub sessions: RwLock<SessionManager>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = connect_sqlite(&config.database_path).await?;
        let store = SqliteDungeonStore::new(pool).await?;
        Self::with_store(config, Arc::new(store)).await
    }

    /// Build the state around an already opened store
    pub async fn with_store(config: AppConfig, store: Arc<SqliteDungeonStore>) -> Result<Self> {
        let item_types = store
            .list_item_types()
            .await
            .context("Failed to load spawnable item types")?;
        tracing::info!(count = item_types.len(), "Loaded spawnable item types");
        let world = Arc::new(InMemoryWorld::new(item_types));

        let locks = Arc::new(ObjectLockService::new(chrono::Duration::seconds(
            config.lock_ttl_secs,
        )));
        let dispatcher = Dispatcher::new(Arc::new(DungeonServiceImpl::new(
            store.clone(),
            config.palette_category_id,
        )));

        Ok(Self {
            config,
            store,
            world,
            locks,
            dispatcher,
            sessions: RwLock::new(SessionManager::new()),
        })
    }

    /// Place the actor's ship and open an idle editing session for it
    pub async fn open_session(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<EditingSession> {
        let ship_id = self
            .world
            .spawn_ship(user_id, location_id, Vec3::ZERO)
            .await
            .context("Failed to place the actor's ship")?;

        Ok(EditingSession::new(
            ActorContext {
                user_id,
                location_id,
                ship_id,
            },
            self.store.clone(),
            self.world.clone(),
            self.locks.clone(),
            EditorSettings {
                xyz_basis: self.config.xyz_basis,
            },
        ))
    }
}

async fn connect_sqlite(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }
    }

    SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path))
        .await
        .with_context(|| format!("Failed to open dungeon database at {path}"))
}


#[cfg(test)]
mod tests {
    use super::test_support::test_state;
    use super::*;

    #[tokio::test]
    async fn test_open_session_places_ship() {
        let state = test_state().await;

        let session = state
            .open_session(UserId::new(9), LocationId::new(30000142))
            .await
            .unwrap();

        let ship = state.world.get(session.actor().ship_id).await.unwrap();
        assert_eq!(ship.location_id, LocationId::new(30000142));
        assert_eq!(state.world.entity_count().await, 1);
    }

    #[tokio::test]
    async fn test_connect_creates_database_directory() {
        let dir = std::env::temp_dir().join(format!("dungeon-editor-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("dungeons.db");

        let pool = connect_sqlite(path.to_str().unwrap()).await.unwrap();
        pool.close().await;

        assert!(path.exists());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
