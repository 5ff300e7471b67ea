//! Scripted in-memory gateway for tests.

use std::sync::Mutex;

use super::serialized::ALL_LAYOUTS_KEY;
use super::{GatewayError, LayoutGateway};
use crate::common::collections::{BTreeMap, HashMap};
use crate::model::{DEFAULT_LAYOUT_NAME, Layout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    FetchByName(String),
    FetchAll,
    Create(String),
    Replace(String),
    Delete(String),
    Reset,
}

#[derive(Default)]
struct State {
    layouts: BTreeMap<String, Layout>,
    calls: Vec<Call>,
    failure: Option<GatewayError>,
    next_id: u32,
    latency: usize,
    active: HashMap<String, usize>,
    max_active: HashMap<String, usize>,
    active_overall: usize,
    max_active_overall: usize,
}

/// Behaves like a well-mannered layout service: assigns ids on create,
/// returns items sorted by row then column, 404s unknown names.
#[derive(Default)]
pub(crate) struct FakeGateway {
    state: Mutex<State>,
}

pub(crate) fn server_default() -> Layout {
    Layout { id: Some("server-default".into()), ..Layout::build_default() }
}

fn normalized(mut layout: Layout) -> Layout {
    layout.items.sort_by_key(|item| (item.y, item.x));
    layout
}

impl FakeGateway {
    pub(crate) fn new() -> Self { Self::default() }

    /// Stores `layout` server-side, giving it an id `<name>-id` if it has
    /// none.
    pub(crate) fn with_layout(self, mut layout: Layout) -> Self {
        if layout.id.is_none() {
            layout.id = Some(format!("{}-id", layout.name));
        }
        self.state.lock().unwrap().layouts.insert(layout.name.clone(), layout);
        self
    }

    /// Number of scheduler yields each call spends "on the network".
    pub(crate) fn with_latency(self, yields: usize) -> Self {
        self.state.lock().unwrap().latency = yields;
        self
    }

    /// Every call fails with `err` until [`FakeGateway::recover`].
    pub(crate) fn fail_with(&self, err: GatewayError) {
        self.state.lock().unwrap().failure = Some(err);
    }

    pub(crate) fn go_down(&self) { self.fail_with(GatewayError::unavailable("connection refused")) }

    pub(crate) fn recover(&self) { self.state.lock().unwrap().failure = None; }

    pub(crate) fn calls(&self) -> Vec<Call> { self.state.lock().unwrap().calls.clone() }

    pub(crate) fn stored(&self, name: &str) -> Option<Layout> {
        self.state.lock().unwrap().layouts.get(name).cloned()
    }

    pub(crate) fn max_concurrent(&self, key: &str) -> usize {
        self.state.lock().unwrap().max_active.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn max_concurrent_overall(&self) -> usize {
        self.state.lock().unwrap().max_active_overall
    }

    async fn enter(&self, key: &str, call: Call) -> Result<(), GatewayError> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            let active = state.active.entry(key.to_string()).or_default();
            *active += 1;
            let active = *active;
            let max = state.max_active.entry(key.to_string()).or_default();
            *max = (*max).max(active);
            state.active_overall += 1;
            state.max_active_overall = state.max_active_overall.max(state.active_overall);
            state.latency
        };
        for _ in 0..latency {
            tokio::task::yield_now().await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(active) = state.active.get_mut(key) {
            *active -= 1;
        }
        state.active_overall -= 1;
        match &state.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl LayoutGateway for FakeGateway {
    async fn fetch_by_name(&self, name: &str) -> Result<Layout, GatewayError> {
        self.enter(name, Call::FetchByName(name.to_string())).await?;
        self.stored(name).ok_or_else(|| GatewayError::not_found(name))
    }

    async fn fetch_all(&self) -> Result<Vec<Layout>, GatewayError> {
        self.enter(ALL_LAYOUTS_KEY, Call::FetchAll).await?;
        Ok(self.state.lock().unwrap().layouts.values().cloned().collect())
    }

    async fn create(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        self.enter(&layout.name, Call::Create(layout.name.clone())).await?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = Layout {
            id: Some(format!("srv-{}", state.next_id)),
            ..normalized(layout.clone())
        };
        state.layouts.insert(created.name.clone(), created.clone());
        Ok(created)
    }

    async fn replace(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        self.enter(&layout.name, Call::Replace(layout.name.clone())).await?;
        let mut state = self.state.lock().unwrap();
        let known = state
            .layouts
            .get(&layout.name)
            .is_some_and(|existing| existing.id.is_some() && existing.id == layout.id);
        if !known {
            return Err(GatewayError::not_found(&layout.name));
        }
        let replaced = normalized(layout.clone());
        state.layouts.insert(replaced.name.clone(), replaced.clone());
        Ok(replaced)
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), GatewayError> {
        self.enter(name, Call::Delete(name.to_string())).await?;
        match self.state.lock().unwrap().layouts.remove(name) {
            Some(_) => Ok(()),
            None => Err(GatewayError::not_found(name)),
        }
    }

    async fn reset_to_default(&self) -> Result<Layout, GatewayError> {
        self.enter(DEFAULT_LAYOUT_NAME, Call::Reset).await?;
        let layout = server_default();
        self.state.lock().unwrap().layouts.insert(layout.name.clone(), layout.clone());
        Ok(layout)
    }
}
