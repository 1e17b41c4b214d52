//! Application state shared across all handlers.

use std::sync::Arc;

use boxoffice_core::config::AppConfig;
use boxoffice_core::traits::{CacheProvider, CoordinationStore};
use boxoffice_database::DatabasePool;
use boxoffice_service::{BookingService, EventCatalog, WaitlistService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool; `None` when running on in-process stores
    pub database: Option<DatabasePool>,
    /// View cache
    pub cache: Arc<dyn CacheProvider>,
    /// Lock and queue store
    pub coordination: Arc<dyn CoordinationStore>,

    // ── Services ─────────────────────────────────────────────
    /// Booking and cancellation
    pub booking: Arc<BookingService>,
    /// Waitlist queue
    pub waitlist: Arc<WaitlistService>,
    /// Event and user administration
    pub catalog: Arc<EventCatalog>,
}
