//! Application state shared across handlers

use std::time::Duration;

use attendance::{AttendanceAggregator, AttendanceStore, CheckInRecorder};

/// Application state shared across handlers
///
/// Generic over the store so route tests can run against
/// [`attendance::MemoryStore`].
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub recorder: CheckInRecorder<S>,
    pub aggregator: AttendanceAggregator<S>,
    pub store_timeout: Duration,
}

impl<S: AttendanceStore + Clone> AppState<S> {
    pub fn new(store: S, store_timeout: Duration) -> Self {
        Self {
            recorder: CheckInRecorder::new(store.clone(), store_timeout),
            aggregator: AttendanceAggregator::new(store.clone(), store_timeout),
            store,
            store_timeout,
        }
    }
}

/// Liveness of the backing store, reported by `/health` and the probe
pub trait StoreHealth: Send + Sync {
    fn is_healthy(&self) -> impl Future<Output = bool> + Send;
}

impl StoreHealth for attendance::MemoryStore {
    async fn is_healthy(&self) -> bool {
        use attendance::RosterStore;
        self.find_organization(uuid::Uuid::nil()).await.is_ok()
    }
}

/// Everything a handler needs from the store
pub trait Store:
    AttendanceStore + attendance::RosterStore + StoreHealth + Clone + Send + Sync + 'static
{
}

impl<T> Store for T where
    T: AttendanceStore + attendance::RosterStore + StoreHealth + Clone + Send + Sync + 'static
{
}
