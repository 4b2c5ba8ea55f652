//! Application configuration

use std::env;

use anyhow::{Context, Result};

use crate::application::services::PositionBasis;
use crate::domain::value_objects::CategoryId;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the SQLite dungeon database file
    pub database_path: String,

    /// WebSocket server port
    pub server_port: u16,

    /// How long an object stays locked after it was selected
    pub lock_ttl_secs: i64,

    /// Item-group category whose types make up the placement palette
    pub palette_category_id: CategoryId,

    /// Reference point for `EditObjectXYZ` offsets
    pub xyz_basis: PositionBasis,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_path: env::var("DUNGEON_DB_PATH")
                .unwrap_or_else(|_| "./data/dungeons.db".to_string()),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,

            lock_ttl_secs: env::var("LOCK_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("LOCK_TTL_SECS must be a number of seconds")?,

            palette_category_id: env::var("PALETTE_CATEGORY_ID")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<i64>()
                .map(CategoryId::new)
                .context("PALETTE_CATEGORY_ID must be an integer")?,

            xyz_basis: env::var("EDITOR_XYZ_BASIS")
                .unwrap_or_else(|_| "ship".to_string())
                .parse()
                .context("EDITOR_XYZ_BASIS must be 'ship' or 'room'")?,
        })
    }
}
