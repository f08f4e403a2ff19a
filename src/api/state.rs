//! API shared state containing actor handles

use std::sync::Arc;

use crate::actors::supervisor::MonitorHandle;
use crate::events::EventBus;
use crate::sites::SiteManager;
use crate::storage::CheckStore;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the monitor supervisor
    pub monitor: MonitorHandle,

    /// Event bus for SSE streaming and control notifications
    pub bus: EventBus,

    /// Store for domain configs and check history
    pub store: Arc<dyn CheckStore>,

    /// Host site control adapter
    pub sites: Arc<SiteManager>,
}

impl ApiState {
    pub fn new(
        monitor: MonitorHandle,
        bus: EventBus,
        store: Arc<dyn CheckStore>,
        sites: Arc<SiteManager>,
    ) -> Self {
        Self {
            monitor,
            bus,
            store,
            sites,
        }
    }
}
