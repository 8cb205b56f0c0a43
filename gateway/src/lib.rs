//! Gateway library for InProcess service calls
//!
//! Exposes the attendance service over HTTP. The [`ServiceRouter`] can also
//! be used directly for InProcess calls.

pub mod config;
pub mod router;
pub mod routes;

use std::sync::Arc;

use attendance_service::AttendanceService;
use directory::DirectoryService;
use store::RecordStore;

pub use config::GatewayConfig;
pub use router::{parse_date, ServiceRouter};
pub use routes::{app, ApiError, AppState};

/// Wire the service, router and HTTP state from configuration.
pub fn build_state(
    config: &GatewayConfig,
    store: Arc<dyn RecordStore>,
    directory: Arc<dyn DirectoryService>,
) -> AppState {
    let service = AttendanceService::new(store, directory, config.attendance.clone());
    let router = ServiceRouter::new(service, config.directory.cache_ttl());
    AppState {
        router: Arc::new(router),
        version: config.version.clone(),
    }
}
