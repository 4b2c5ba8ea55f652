//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite dungeon store
//! - World: in-memory entity container
//! - HTTP: health probe and websocket upgrade
//! - WebSocket: remote calls from editor clients
//! - Config, State and Session management

pub mod config;
pub mod http;
pub mod persistence;
pub mod session;
pub mod state;
pub mod websocket;
pub mod world;
