use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::trace;

use super::{GatewayError, LayoutGateway};
use crate::model::{DEFAULT_LAYOUT_NAME, Layout};

/// Key guarding the list-all call, which is not tied to one layout name.
pub(crate) const ALL_LAYOUTS_KEY: &str = "*";

/// Gateway decorator allowing at most one in-flight remote call per layout
/// name. Clones share the same guards, so every session built on a clone is
/// serialized against the others. Calls for different names still run
/// concurrently.
pub struct SerializedGateway<G> {
    inner: Arc<G>,
    in_flight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl<G> Clone for SerializedGateway<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<G> std::fmt::Debug for SerializedGateway<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedGateway")
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<G: LayoutGateway> SerializedGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner: Arc::new(inner),
            in_flight: Arc::default(),
        }
    }

    pub fn inner(&self) -> &G { &self.inner }

    /// Number of names with a call running or queued.
    pub fn in_flight(&self) -> usize { self.in_flight.len() }

    async fn guarded<T>(&self, key: &str, call: impl Future<Output = T>) -> T {
        let entry = InFlightEntry::enter(&self.in_flight, key);
        let _guard = entry.lock.lock().await;
        trace!(key, "remote call started");
        call.await
    }
}

/// One call's hold on a name's lock. Dropping it, whether the call finished
/// or was abandoned while queued, removes the name once nobody else holds it.
struct InFlightEntry<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlightEntry<'a> {
    fn enter(map: &'a DashMap<String, Arc<Mutex<()>>>, key: &'a str) -> Self {
        // Clone the lock out so no map shard stays borrowed across the await.
        let lock = Arc::clone(map.entry(key.to_string()).or_default().value());
        Self { map, key, lock }
    }
}

impl Drop for InFlightEntry<'_> {
    fn drop(&mut self) {
        // Two references left: the map's and this entry's.
        self.map.remove_if(self.key, |_, lock| Arc::strong_count(lock) == 2);
    }
}

impl<G: LayoutGateway> LayoutGateway for SerializedGateway<G> {
    async fn fetch_by_name(&self, name: &str) -> Result<Layout, GatewayError> {
        self.guarded(name, self.inner.fetch_by_name(name)).await
    }

    async fn fetch_all(&self) -> Result<Vec<Layout>, GatewayError> {
        self.guarded(ALL_LAYOUTS_KEY, self.inner.fetch_all()).await
    }

    async fn create(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        self.guarded(&layout.name, self.inner.create(layout)).await
    }

    async fn replace(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        self.guarded(&layout.name, self.inner.replace(layout)).await
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), GatewayError> {
        self.guarded(name, self.inner.delete_by_name(name)).await
    }

    async fn reset_to_default(&self) -> Result<Layout, GatewayError> {
        self.guarded(DEFAULT_LAYOUT_NAME, self.inner.reset_to_default()).await
    }
}
