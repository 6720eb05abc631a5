// poolsync-core: Synchronization engine between poolsync-api and a smart-home host.

pub mod adapters;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod model;
pub mod pairing;
pub mod ports;
pub mod recommendations;
pub mod scheduler;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ApiConfig, DEFAULT_POLL_INTERVAL, SyncConfig};
pub use coordinator::{DeviceSyncCoordinator, SyncContext};
pub use engine::{DeviceLifecycle, SyncEngine};
pub use error::CoreError;
pub use model::{Settings, SyncOutcome, SyncReport, SyncSnapshot, SyncStatus};
pub use pairing::{PairingCandidate, pairing_candidates};
pub use ports::{DeviceSink, Notifier, PoolApi, RecommendationEvent, StateStore};
pub use recommendations::{NewRecommendation, RecommendationDiff, RecommendationStore, diff};
pub use scheduler::PollScheduler;

// Wire types callers need alongside the engine.
pub use poolsync_api::{ErrorKind, PoolId, PoolSummary};
