use std::sync::Arc;

use thiserror::Error;

use crate::core::auth::{authenticate, AuthError, UserClaims};
use crate::core::config::Settings;
use crate::services::api::{ExamApi, HttpExamApi};
use crate::services::local_store::{FileStore, LocalStore, StoreError};

/// Session-scoped dependency bundle for one authenticated user navigating an
/// exam flow. Constructed when the shell enters the flow, dropped on leaving
/// it; controllers receive a clone instead of reaching for globals.
#[derive(Clone)]
pub struct FlowContext {
    inner: Arc<InnerContext>,
}

struct InnerContext {
    settings: Settings,
    api: Arc<dyn ExamApi>,
    store: Arc<dyn LocalStore>,
    user: UserClaims,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to build api client")]
    Api(#[source] anyhow::Error),
}

impl FlowContext {
    pub fn new(
        settings: Settings,
        api: Arc<dyn ExamApi>,
        store: Arc<dyn LocalStore>,
        user: UserClaims,
    ) -> Self {
        Self { inner: Arc::new(InnerContext { settings, api, store, user }) }
    }

    /// Wire up the default collaborators: an HTTP client against the remote
    /// API and a file-backed local store. Declines with `Unauthenticated`
    /// when no usable token is available; the shell redirects to login.
    pub fn connect(settings: Settings, access_token: Option<&str>) -> Result<Self, ContextError> {
        let user = authenticate(access_token)?;

        let api = HttpExamApi::from_settings(&settings, access_token.map(str::to_string))
            .map_err(ContextError::Api)?;
        let store = FileStore::new(settings.storage().state_dir.clone())?;

        Ok(Self::new(settings, Arc::new(api), Arc::new(store), user))
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn api(&self) -> &Arc<dyn ExamApi> {
        &self.inner.api
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.inner.store
    }

    pub fn user(&self) -> &UserClaims {
        &self.inner.user
    }
}
