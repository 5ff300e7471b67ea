use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::error::{LayoutError, ValidationError};
use super::geometry::find_free_position;
use crate::common::config::LayoutSettings;
use crate::gateway::LayoutGateway;
use crate::model::layout::check_size;
use crate::model::{DEFAULT_LAYOUT_NAME, Layout, SessionSnapshot, WidgetPlacement, WidgetSize};

/// Message left in [`EngineState::error`] whenever a read falls back to the
/// built-in layout.
pub const FALLBACK_MESSAGE: &str = "remote unavailable, using local layout";

/// Where the layout adopted by [`LayoutEngine::fetch`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LayoutSource {
    Remote,
    Fallback,
}

/// Everything a dashboard view renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineState {
    pub current_layout: Option<Layout>,
    pub all_layouts: Vec<Layout>,
    pub is_loading: bool,
    /// User-facing message of the last failure, cleared when the next
    /// operation starts.
    pub error: Option<String>,
    pub is_using_fallback: bool,
}

/// The layout state of one dashboard session.
///
/// Reads fall back to [`Layout::build_default`] when the remote store is off
/// or unreachable; writes never do, their failures are returned. Widget edits
/// are purely local until [`LayoutEngine::save`] or [`LayoutEngine::update`].
pub struct LayoutEngine<G> {
    gateway: G,
    settings: LayoutSettings,
    state: EngineState,
}

impl<G: LayoutGateway> LayoutEngine<G> {
    pub fn new(gateway: G, settings: LayoutSettings) -> Self {
        Self {
            gateway,
            settings,
            state: EngineState::default(),
        }
    }

    pub fn gateway(&self) -> &G { &self.gateway }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    fn remote_enabled(&self) -> bool { self.settings.use_remote_layouts }

    fn begin(&mut self) {
        self.state.is_loading = true;
        self.state.error = None;
    }

    /// Ends an operation: records a failure in `error` under `context` and
    /// hands the result back.
    fn finish<T>(&mut self, context: &str, result: Result<T, LayoutError>) -> Result<T, LayoutError> {
        self.state.is_loading = false;
        if let Err(err) = &result {
            warn!(kind = %err.kind(), "{context}: {err}");
            self.state.error = Some(format!("{context}: {err}"));
        }
        result
    }

    fn fail<T>(&mut self, context: &str, err: impl Into<LayoutError>) -> Result<T, LayoutError> {
        self.finish(context, Err(err.into()))
    }

    fn fall_back(&mut self) {
        self.state.current_layout = Some(Layout::build_default());
        self.state.is_using_fallback = true;
    }

    fn current_mut(&mut self) -> Result<&mut Layout, ValidationError> {
        self.state.current_layout.as_mut().ok_or(ValidationError::NoActiveLayout)
    }

    /// Loads the layout called `name`, or the built-in default if the remote
    /// store is off or the call fails.
    #[instrument(skip(self))]
    pub async fn fetch(&mut self, name: &str) -> LayoutSource {
        self.begin();
        self.state.is_using_fallback = false;

        if !self.remote_enabled() {
            debug!("remote layouts disabled, serving built-in default");
            self.fall_back();
            self.state.is_loading = false;
            return LayoutSource::Fallback;
        }

        let result = self.gateway.fetch_by_name(name).await;
        self.state.is_loading = false;
        match result {
            Ok(layout) => {
                info!(items = layout.items.len(), "layout loaded");
                self.state.current_layout = Some(layout);
                LayoutSource::Remote
            }
            Err(err) => {
                warn!(%err, "falling back to built-in layout");
                self.fall_back();
                self.state.error = Some(FALLBACK_MESSAGE.to_string());
                LayoutSource::Fallback
            }
        }
    }

    pub async fn fetch_default(&mut self) -> LayoutSource { self.fetch(DEFAULT_LAYOUT_NAME).await }

    #[instrument(skip(self))]
    pub async fn fetch_all(&mut self) -> Result<&[Layout], LayoutError> {
        const CONTEXT: &str = "could not load layouts";
        self.begin();
        if !self.remote_enabled() {
            return self.fail(CONTEXT, LayoutError::RemoteDisabled);
        }
        match self.gateway.fetch_all().await {
            Ok(layouts) => {
                info!(count = layouts.len(), "layouts listed");
                self.state.all_layouts = layouts;
                self.state.is_loading = false;
                Ok(self.state.all_layouts.as_slice())
            }
            Err(err) => self.fail(CONTEXT, err),
        }
    }

    /// Checks the current layout can be written and returns a copy of it.
    fn writable(&self, needs_id: bool) -> Result<Layout, LayoutError> {
        let layout = self.state.current_layout.as_ref().ok_or(ValidationError::NoActiveLayout)?;
        if layout.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if layout.items.is_empty() {
            return Err(ValidationError::EmptyItems.into());
        }
        if needs_id && !layout.is_persisted() {
            return Err(ValidationError::MissingId.into());
        }
        if !self.remote_enabled() {
            return Err(LayoutError::RemoteDisabled);
        }
        Ok(layout.clone())
    }

    /// Persists the current layout as a new remote layout and adopts the
    /// server's copy.
    #[instrument(skip(self))]
    pub async fn save(&mut self) -> Result<&Layout, LayoutError> {
        const CONTEXT: &str = "could not save layout";
        self.begin();
        let layout = match self.writable(false) {
            Ok(layout) => layout,
            Err(err) => return self.fail(CONTEXT, err),
        };
        match self.gateway.create(&layout).await {
            Ok(saved) => {
                info!(name = %saved.name, id = ?saved.id, "layout saved");
                self.state.is_loading = false;
                Ok(&*self.state.current_layout.insert(saved))
            }
            Err(err) => self.fail(CONTEXT, err),
        }
    }

    /// Overwrites the remote copy of the current layout, which must have been
    /// saved before.
    #[instrument(skip(self))]
    pub async fn update(&mut self) -> Result<&Layout, LayoutError> {
        const CONTEXT: &str = "could not update layout";
        self.begin();
        let layout = match self.writable(true) {
            Ok(layout) => layout,
            Err(err) => return self.fail(CONTEXT, err),
        };
        match self.gateway.replace(&layout).await {
            Ok(updated) => {
                info!(name = %updated.name, "layout updated");
                self.state.is_loading = false;
                Ok(&*self.state.current_layout.insert(updated))
            }
            Err(err) => self.fail(CONTEXT, err),
        }
    }

    /// Deletes a saved layout. Deleting the active one reloads the default.
    #[instrument(skip(self))]
    pub async fn delete_layout(&mut self, name: &str) -> Result<(), LayoutError> {
        const CONTEXT: &str = "could not delete layout";
        self.begin();
        if name == DEFAULT_LAYOUT_NAME {
            return self.fail(CONTEXT, ValidationError::ProtectedDefault);
        }
        if !self.remote_enabled() {
            return self.fail(CONTEXT, LayoutError::RemoteDisabled);
        }
        if let Err(err) = self.gateway.delete_by_name(name).await {
            return self.fail(CONTEXT, err);
        }

        info!("layout deleted");
        self.state.all_layouts.retain(|layout| layout.name != name);
        let was_current = self.state.current_layout.as_ref().is_some_and(|layout| layout.name == name);
        if was_current {
            self.fetch_default().await;
        }
        self.state.is_loading = false;
        Ok(())
    }

    /// Restores the default layout, server-side when possible.
    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> LayoutSource {
        self.begin();

        if !self.remote_enabled() || self.state.is_using_fallback {
            debug!("resetting to built-in default without a remote call");
            self.state.current_layout = Some(Layout::build_default());
            self.state.is_loading = false;
            return LayoutSource::Fallback;
        }

        let result = self.gateway.reset_to_default().await;
        self.state.is_loading = false;
        match result {
            Ok(layout) => {
                info!("layout reset on the server");
                self.state.current_layout = Some(layout);
                LayoutSource::Remote
            }
            Err(err) => {
                warn!(%err, "reset failed, using built-in layout");
                self.fall_back();
                self.state.error = Some(FALLBACK_MESSAGE.to_string());
                LayoutSource::Fallback
            }
        }
    }

    /// Places a new widget at the first free spot of the current layout.
    #[instrument(skip(self))]
    pub fn add_widget(&mut self, id: &str, size: WidgetSize) -> Result<WidgetPlacement, LayoutError> {
        self.state.error = None;
        let result = self.place_widget(id, size);
        self.finish("could not add widget", result)
    }

    fn place_widget(&mut self, id: &str, size: WidgetSize) -> Result<WidgetPlacement, LayoutError> {
        let layout = self.current_mut()?;
        if layout.has_widget(id) {
            return Err(ValidationError::DuplicateWidget(id.to_string()).into());
        }
        check_size(id, &size)?;
        let (x, y) = find_free_position(size.w, size.h, &layout.rects());
        let placement = WidgetPlacement::sized(id, x, y, size);
        layout.items.push(placement.clone());
        debug!(x, y, "widget added");
        Ok(placement)
    }

    /// Removes the first widget with `id`. Returns whether one was removed;
    /// an unknown id is not an error.
    #[instrument(skip(self))]
    pub fn remove_widget(&mut self, id: &str) -> bool {
        self.state.error = None;
        let Some(layout) = self.state.current_layout.as_mut() else {
            _ = self.fail::<()>("could not remove widget", ValidationError::NoActiveLayout);
            return false;
        };
        match layout.items.iter().position(|item| item.id == id) {
            Some(idx) => {
                layout.items.remove(idx);
                debug!("widget removed");
                true
            }
            None => false,
        }
    }

    /// Swaps in the items produced by an external drag or resize as is.
    pub fn replace_all_items(&mut self, items: Vec<WidgetPlacement>) -> Result<(), LayoutError> {
        self.state.error = None;
        let result = match self.current_mut() {
            Ok(layout) => {
                layout.items = items;
                Ok(())
            }
            Err(err) => Err(err.into()),
        };
        self.finish("could not update widgets", result)
    }

    pub fn move_widget(&mut self, id: &str, x: u32, y: u32) -> Result<(), LayoutError> {
        self.state.error = None;
        let result = self.edit_widget(id, |widget| widget.move_to(x, y));
        self.finish("could not move widget", result)
    }

    pub fn resize_widget(&mut self, id: &str, w: u32, h: u32) -> Result<(), LayoutError> {
        self.state.error = None;
        let result = self.edit_widget(id, |widget| widget.resize(w, h));
        self.finish("could not resize widget", result)
    }

    fn edit_widget(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut WidgetPlacement) -> Result<(), ValidationError>,
    ) -> Result<(), LayoutError> {
        let widget = self
            .current_mut()?
            .widget_mut(id)
            .ok_or_else(|| ValidationError::UnknownWidget(id.to_string()))?;
        Ok(edit(widget)?)
    }

    /// Drops all state, as if the engine had just been built.
    pub fn clear(&mut self) { self.state = EngineState::default(); }

    pub fn state(&self) -> &EngineState { &self.state }

    pub fn current_layout(&self) -> Option<&Layout> { self.state.current_layout.as_ref() }

    pub fn has_layout(&self) -> bool { self.state.current_layout.is_some() }

    pub fn layout_items(&self) -> &[WidgetPlacement] {
        self.state.current_layout.as_ref().map(|layout| layout.items.as_slice()).unwrap_or_default()
    }

    pub fn has_widget(&self, id: &str) -> bool {
        self.state.current_layout.as_ref().is_some_and(|layout| layout.has_widget(id))
    }

    pub fn all_layouts(&self) -> &[Layout] { &self.state.all_layouts }

    pub fn is_loading(&self) -> bool { self.state.is_loading }

    pub fn error(&self) -> Option<&str> { self.state.error.as_deref() }

    pub fn is_using_fallback(&self) -> bool { self.state.is_using_fallback }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_layout: self.state.current_layout.clone(),
            is_using_fallback: self.state.is_using_fallback,
        }
    }

    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.state.current_layout = snapshot.current_layout;
        self.state.is_using_fallback = snapshot.is_using_fallback;
    }
}
