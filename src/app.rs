//! Picker session controller
//!
//! Ties the catalog store, the session guard, the selection state machine
//! and the request composer together. Every collaborator call goes through
//! the guard; everything else is synchronous state manipulation.

use crate::catalog::{ActorGroup, CatalogStore, ColourSet, Scale};
use crate::config::PickerSettings;
use crate::networking::{Collaborator, GuardState, LoginForm, NetworkError, SessionEvent, SessionGuard};
use crate::request::{download_filename, OutputFormat, OutputMode, RenderRequest, RequestComposer};
use crate::selection::{Selection, SelectionState, TextCommit, TextField, TextInputs};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PickerError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Unknown actor: {0}")]
    UnknownActor(String),

    #[error("No actor is ready yet")]
    NotReady,
}

impl PickerError {
    /// Failure that only a full client reload recovers from
    pub fn needs_reload(&self) -> bool {
        match self {
            PickerError::Network(e) => {
                e.kind() == crate::networking::ErrorKind::OtherCollaboratorFailure
            }
            _ => false,
        }
    }
}

/// A downloaded render and the file name the service would suggest
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub request: RenderRequest,
    pub format: OutputFormat,
    pub filename: String,
    pub data: Bytes,
}

pub struct PickerController {
    settings: PickerSettings,
    collaborator: Arc<dyn Collaborator>,
    catalog: CatalogStore,
    session: SessionGuard,
    selection: Mutex<SelectionState>,
    text: Mutex<TextInputs>,
    text_commits: Mutex<mpsc::UnboundedReceiver<TextCommit>>,
    composer: RequestComposer,
}

impl PickerController {
    pub fn new(
        collaborator: Arc<dyn Collaborator>,
        settings: PickerSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (session, events) = SessionGuard::new(Arc::clone(&collaborator), settings.server.auth_required);
        let (text, text_commits) = TextInputs::new(Duration::from_millis(settings.input.debounce_ms));
        let controller = Self {
            catalog: CatalogStore::new(Arc::clone(&collaborator)),
            composer: RequestComposer::with_limits(settings.limits.clone()),
            collaborator,
            session,
            selection: Mutex::new(SelectionState::new()),
            text: Mutex::new(text),
            text_commits: Mutex::new(text_commits),
            settings,
        };
        (controller, events)
    }

    pub fn settings(&self) -> &PickerSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub async fn session_state(&self) -> GuardState {
        self.session.state().await
    }

    /// Load the catalog, the default actor and its colour sets.
    ///
    /// Returns `false` without calling anything while unauthenticated.
    pub async fn startup(&self) -> Result<bool, PickerError> {
        if !self.session.begin_startup().await {
            info!("⏸️ Startup deferred until login");
            return Ok(false);
        }
        info!("🚀 Starting picker session");
        self.catalog.clear().await;

        let actors = self.session.call("catalog", || self.catalog.load_catalog()).await?;

        let default_slug = &self.settings.startup.default_actor;
        let slug = if actors.iter().any(|a| &a.slug == default_slug) {
            Some(default_slug.clone())
        } else {
            warn!("Default actor {} not in catalog", default_slug);
            actors.first().map(|a| a.slug.clone())
        };
        if let Some(slug) = slug {
            self.select_actor(&slug).await?;
        }

        self.session.mark_ready().await;
        Ok(true)
    }

    /// Switch to another actor. `Ok(false)` if a newer switch superseded
    /// this one while its detail was loading.
    pub async fn select_actor(&self, slug: &str) -> Result<bool, PickerError> {
        let actor = self
            .catalog
            .actor(slug)
            .await
            .ok_or_else(|| PickerError::UnknownActor(slug.to_string()))?;

        let ticket = self.selection.lock().await.select_actor(actor);
        self.text.lock().await.reset();

        let detail = self
            .session
            .call("actor detail", || self.catalog.load_actor_detail(slug))
            .await?;
        if !self.selection.lock().await.finish_loading(&ticket, detail) {
            return Ok(false);
        }

        let colours = self
            .session
            .call("colour sets", || self.catalog.load_colour_sets(slug))
            .await?;
        Ok(self.selection.lock().await.apply_colours(slug, colours))
    }

    /// Submit the login form, replaying startup once if it is due
    pub async fn login(&self, form: &mut LoginForm) -> Result<bool, PickerError> {
        let replay = self.session.login(form).await?;
        if replay {
            self.startup().await?;
        } else {
            self.session.mark_ready().await;
        }
        Ok(replay)
    }

    pub async fn logout(&self) -> Result<(), PickerError> {
        self.session.logout(self.settings.server.auth_required).await?;
        self.discard_session_state().await;
        Ok(())
    }

    /// Full client reload: drop every cache and choice, then start over
    pub async fn reload(&self) -> Result<bool, PickerError> {
        warn!("🔄 Reloading picker");
        self.session.take_reload_request().await;
        self.discard_session_state().await;
        self.startup().await
    }

    /// Reload if a collaborator failure asked for one
    pub async fn reload_if_requested(&self) -> Result<bool, PickerError> {
        if self.session.take_reload_request().await {
            self.discard_session_state().await;
            return self.startup().await;
        }
        Ok(false)
    }

    async fn discard_session_state(&self) {
        self.catalog.clear().await;
        self.selection.lock().await.reset();
        self.text.lock().await.reset();
    }

    pub async fn grouped_actors(&self) -> Vec<ActorGroup> {
        self.catalog.grouped().await
    }

    pub async fn selection(&self) -> Option<Selection> {
        self.selection.lock().await.ready().cloned()
    }

    pub async fn target_actor_slug(&self) -> Option<String> {
        self.selection.lock().await.target_actor().map(|a| a.slug.clone())
    }

    /// Mutate the ready selection; `None` while nothing is ready
    pub async fn update<R>(&self, f: impl FnOnce(&mut Selection) -> R) -> Option<R> {
        self.selection.lock().await.ready_mut().map(f)
    }

    pub async fn add_skin(&self, name: &str) -> bool {
        self.update(|sel| {
            let skin = sel.detail().skin(name).cloned();
            skin.map_or(false, |skin| sel.add_skin(&skin))
        })
        .await
        .unwrap_or(false)
    }

    pub async fn remove_skin(&self, name: &str) -> bool {
        self.selection.lock().await.remove_skin(name)
    }

    pub async fn set_animation(&self, name: &str) -> bool {
        self.selection.lock().await.set_animation(name)
    }

    pub async fn set_scale(&self, scale: Scale) -> bool {
        self.selection.lock().await.set_scale(scale)
    }

    pub async fn set_colour(&self, key: &str, value: &str) -> bool {
        self.selection.lock().await.set_colour(key, value)
    }

    /// Colour sets applicable to the current skins
    pub async fn palette(&self) -> Vec<ColourSet> {
        self.selection
            .lock()
            .await
            .ready()
            .map(|sel| sel.palette())
            .unwrap_or_default()
    }

    pub async fn render_request(&self, mode: OutputMode) -> Option<RenderRequest> {
        let state = self.selection.lock().await;
        self.composer.compose(state.ready()?, mode)
    }

    /// Record a keystroke; the selection sees it after the quiet period
    pub async fn text_input(&self, field: TextField, value: impl Into<String>) {
        self.text.lock().await.input(field, value);
    }

    pub async fn text_value(&self, field: TextField) -> String {
        self.text.lock().await.value(field).to_string()
    }

    /// Wait for the next debounced edit that still applies and apply it
    pub async fn apply_next_text_commit(&self) -> Option<TextCommit> {
        loop {
            let commit = self.text_commits.lock().await.recv().await?;
            if self.apply_text_commit(&commit).await {
                return Some(commit);
            }
        }
    }

    /// Apply every debounced edit that has already fired
    pub async fn apply_ready_text_commits(&self) -> usize {
        let mut applied = 0;
        loop {
            let commit = match self.text_commits.lock().await.try_recv() {
                Ok(commit) => commit,
                Err(_) => break,
            };
            if self.apply_text_commit(&commit).await {
                applied += 1;
            }
        }
        applied
    }

    async fn apply_text_commit(&self, commit: &TextCommit) -> bool {
        // Edits made before an actor switch or reload never reach the new selection
        if !self.text.lock().await.is_current(commit) {
            debug!("Dropping stale {:?} text commit", commit.field);
            return false;
        }
        debug!("⌨️ Committing {:?} text", commit.field);
        let value = commit.value.clone();
        let applied = self
            .update(|sel| match commit.field {
                TextField::Top => sel.set_top_text(value),
                TextField::Bottom => sel.set_bottom_text(value),
            })
            .await;
        if applied.is_none() {
            debug!("Dropping text commit: no actor ready");
        }
        applied.is_some()
    }

    /// Compose and download a render through the guard
    pub async fn fetch_render(&self, mode: OutputMode, download: bool) -> Result<RenderOutput, PickerError> {
        let (request, filename) = {
            let state = self.selection.lock().await;
            let selection = state.ready().ok_or(PickerError::NotReady)?;
            let request = self.composer.compose(selection, mode).ok_or(PickerError::NotReady)?;
            let animation = selection.animation().map(|a| a.name.as_str()).unwrap_or_default();
            let filename = download_filename(selection.actor(), animation, mode.format());
            (request, filename)
        };
        let request = if download { request.with_download() } else { request };

        let path = request.path_and_query();
        let data = self
            .session
            .call("render", || self.collaborator.fetch_render(&path))
            .await?;
        Ok(RenderOutput {
            request,
            format: mode.format(),
            filename,
            data,
        })
    }
}
