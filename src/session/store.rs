// Client session store: one explicitly constructed instance per domain

use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::models::Identity;
use crate::session::{
    cache::QueryCache, domain::SessionDomain, error::SessionError, storage::SessionStorage,
};

/// Token and identity from one login; they are only ever set or cleared together
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord<I> {
    pub token: String,
    pub identity: I,
}

/// In-memory session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState<I> {
    pub record: Option<SessionRecord<I>>,
    pub is_loading: bool,
}

/// Session store for one domain.
///
/// Starts loading; `initialize` rehydrates from storage and ends loading
/// exactly once. No guard decision should be taken before that.
pub struct SessionStore<D: SessionDomain> {
    storage: Arc<dyn SessionStorage>,
    cache: Option<QueryCache>,
    state: SessionState<D::Identity>,
    _domain: PhantomData<D>,
}

impl<D: SessionDomain> SessionStore<D> {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            cache: None,
            state: SessionState {
                record: None,
                is_loading: true,
            },
            _domain: PhantomData,
        }
    }

    /// Attach the cache of server-derived data that logout must invalidate
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Rehydrate from storage.
    ///
    /// A missing slot, an unreadable record or a role outside the domain all
    /// end in the logged-out state; the last two also clear the slot.
    pub async fn initialize(&mut self) {
        if !self.state.is_loading {
            debug!("{} session already initialized", D::NAME);
            return;
        }

        self.state.record = self.rehydrate().await;
        self.state.is_loading = false;
    }

    async fn rehydrate(&self) -> Option<SessionRecord<D::Identity>> {
        let token = self.read_slot(D::TOKEN_KEY).await?;
        let stored = self.read_slot(D::IDENTITY_KEY).await?;
        if token.is_empty() {
            return None;
        }

        let identity = match serde_json::from_str::<D::Identity>(&stored) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Discarding unreadable {} session record: {}", D::NAME, e);
                self.clear_slot().await;
                return None;
            }
        };

        if !D::valid_roles().contains(identity.role()) {
            warn!(
                "Discarding {} session with role {} outside [{}]",
                D::NAME,
                identity.role(),
                D::valid_roles()
            );
            self.clear_slot().await;
            return None;
        }

        debug!("Restored {} session for user {}", D::NAME, identity.id());
        Some(SessionRecord { token, identity })
    }

    async fn read_slot(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read {} from session storage: {}", key, e);
                None
            }
        }
    }

    // Recovery path: failures are logged, never surfaced
    async fn clear_slot(&self) {
        if let Err(e) = self.remove_slot().await {
            warn!("Could not clear {} session storage: {}", D::NAME, e);
        }
    }

    async fn remove_slot(&self) -> Result<(), SessionError> {
        self.storage.remove_item(D::TOKEN_KEY).await?;
        self.storage.remove_item(D::IDENTITY_KEY).await
    }

    async fn write_slot(&self, token: &str, identity: &D::Identity) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(identity)?;
        self.storage.set_item(D::TOKEN_KEY, token).await?;
        self.storage.set_item(D::IDENTITY_KEY, &serialized).await
    }

    /// Persist a session returned by the login endpoint and adopt it.
    ///
    /// If either write fails the slot is cleared and the store is left logged
    /// out, so a half-written pair can neither be used nor rehydrated.
    pub async fn login(&mut self, token: &str, identity: D::Identity) -> Result<(), SessionError> {
        if let Err(e) = self.write_slot(token, &identity).await {
            warn!("Could not persist {} session, clearing slot: {}", D::NAME, e);
            self.state.record = None;
            self.clear_slot().await;
            return Err(e);
        }

        info!("{} session started for user {}", D::NAME, identity.id());
        self.state.record = Some(SessionRecord {
            token: token.to_string(),
            identity,
        });
        self.state.is_loading = false;
        Ok(())
    }

    /// End the session: in-memory state, storage slot and attached cache.
    ///
    /// In-memory state is cleared even if storage removal fails.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(record) = self.state.record.take() {
            info!("{} session ended for user {}", D::NAME, record.identity.id());
        }
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
        self.remove_slot().await
    }

    /// Drop the must-change-credentials flag after a successful password change
    pub async fn clear_password_change_requirement(&mut self) -> Result<(), SessionError> {
        let Some(record) = self.state.record.as_mut() else {
            return Ok(());
        };
        record.identity.clear_password_change();

        let serialized = serde_json::to_string(&record.identity)?;
        self.storage.set_item(D::IDENTITY_KEY, &serialized).await
    }

    /// Token to present as `Authorization: Bearer <token>`
    pub fn token(&self) -> Option<&str> {
        self.state.record.as_ref().map(|record| record.token.as_str())
    }

    pub fn identity(&self) -> Option<&D::Identity> {
        self.state.record.as_ref().map(|record| &record.identity)
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// Re-derived on every call: an identity whose role left the domain's set
    /// is not authenticated even before anything clears it.
    pub fn is_authenticated(&self) -> bool {
        self.identity()
            .is_some_and(|identity| D::valid_roles().contains(identity.role()))
    }

    pub fn requires_password_change(&self) -> bool {
        self.identity()
            .is_some_and(|identity| identity.requires_password_change())
    }

    pub fn state(&self) -> &SessionState<D::Identity> {
        &self.state
    }
}
