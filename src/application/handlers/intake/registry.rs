//! Registry of live interview sessions.
//!
//! Maps session ids to engines. Each engine sits behind its own async mutex,
//! so turns within one session are strictly sequential while different
//! sessions proceed in parallel. The map lock is never held across an
//! oracle call.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::engine::InterviewEngine;
use crate::domain::foundation::IntakeSessionId;

/// Shared handle to one session's engine.
pub type SessionHandle = Arc<Mutex<InterviewEngine>>;

/// In-memory registry of running interviews.
#[derive(Default)]
pub struct IntakeSessionRegistry {
    sessions: RwLock<HashMap<IntakeSessionId, SessionHandle>>,
}

impl IntakeSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine under its own session id.
    pub async fn insert(&self, engine: InterviewEngine) -> SessionHandle {
        let id = engine.id().clone();
        let handle = Arc::new(Mutex::new(engine));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, id: &IntakeSessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Removes a session; later lookups for it fail.
    pub async fn remove(&self, id: &IntakeSessionId) -> Option<SessionHandle> {
        self.sessions.write().await.remove(id)
    }

    pub async fn contains(&self, id: &IntakeSessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
