use crate::config::Backend;
use crate::curriculum::Curriculum;
use crate::identity::{IdentityProvider, UserId};
use crate::reconcile::Tracker;
use crate::store::{ProgressStore, Scope};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// Whose tracker a request operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Device,
    User(UserId),
}

impl SessionKey {
    pub fn for_scope(scope: &Scope) -> Self {
        match scope {
            Scope::Device => SessionKey::Device,
            Scope::User(identity) => SessionKey::User(identity.user_id.clone()),
        }
    }
}

pub type Sessions = HashMap<SessionKey, Tracker>;

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub curriculum: Arc<Curriculum>,
    pub store: Arc<dyn ProgressStore>,
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub store_timeout: Option<Duration>,
    /// One tracker per device (local backend) or per signed-in user.
    pub sessions: Arc<Mutex<Sessions>>,
}

impl AppState {
    pub fn new(
        backend: Backend,
        curriculum: Arc<Curriculum>,
        store: Arc<dyn ProgressStore>,
        identity: Option<Arc<dyn IdentityProvider>>,
        store_timeout: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            curriculum,
            store,
            identity,
            store_timeout,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn open_tracker(&self, scope: Scope) -> Tracker {
        Tracker::open(
            Arc::clone(&self.curriculum),
            Arc::clone(&self.store),
            scope,
            self.store_timeout,
        )
        .await
    }

    pub async fn install(&self, tracker: Tracker) {
        let key = SessionKey::for_scope(tracker.scope());
        self.sessions.lock().await.insert(key, tracker);
    }
}
