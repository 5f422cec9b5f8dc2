/// Price synchronization
///
/// `SyncEngine` runs a full pass over all active assets (batch fetch, change
/// computation, persistence) and also exposes a single-asset fetch-and-save path.

pub mod change;
pub mod engine;
pub mod errors;

pub use change::change_percent;
pub use engine::{SyncEngine, SyncSummary, UPSTREAM_SOURCE};
pub use errors::SyncError;
