//! Session management for bound websocket connections
//!
//! Each connection that sent `Bind` owns exactly one editing session. The
//! session sits behind its own async mutex so calls from one connection run
//! in arrival order while different actors proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::services::EditingSession;
use crate::domain::value_objects::UserId;

/// Unique identifier for a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type SharedSession = Arc<Mutex<EditingSession>>;

/// A connection's binding to an actor
#[derive(Clone)]
pub struct BoundClient {
    pub user_id: UserId,
    pub bound_at: DateTime<Utc>,
    pub session: SharedSession,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Connection {0} is not bound to an actor")]
    NotBound(ClientId),

    #[error("Could not open editing session: {0}")]
    Open(#[from] anyhow::Error),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotBound(_) => "NOT_BOUND",
            SessionError::Open(_) => "BIND_FAILED",
        }
    }
}

/// Tracks the editing session bound to each connection
#[derive(Default)]
pub struct SessionManager {
    clients: HashMap<ClientId, BoundClient>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection, returning the session it was bound to before
    ///
    /// The caller is responsible for closing the returned session.
    pub fn bind(&mut self, client_id: ClientId, session: EditingSession) -> Option<SharedSession> {
        let user_id = session.actor().user_id;
        let previous = self.clients.insert(
            client_id,
            BoundClient {
                user_id,
                bound_at: Utc::now(),
                session: Arc::new(Mutex::new(session)),
            },
        );

        tracing::info!(client_id = %client_id, user_id = %user_id, "Client bound");
        previous.map(|bound| bound.session)
    }

    pub fn get(&self, client_id: ClientId) -> Result<BoundClient, SessionError> {
        self.clients
            .get(&client_id)
            .cloned()
            .ok_or(SessionError::NotBound(client_id))
    }

    /// Forget a connection's binding, handing back its session for teardown
    pub fn release(&mut self, client_id: ClientId) -> Option<SharedSession> {
        let bound = self.clients.remove(&client_id)?;
        tracing::info!(
            client_id = %client_id,
            user_id = %bound.user_id,
            bound_for_secs = (Utc::now() - bound.bound_at).num_seconds(),
            "Client released"
        );
        Some(bound.session)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}
